// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat record and its artifact sub-records.

use crate::enums::{AgentType, ChatStatus, ReadyAckStage, TitleStatus};
use crate::ids::{ArtifactId, ChatId, ProjectId};
use serde::{Deserialize, Serialize};

/// One file published from a chat's workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub name: String,
    pub relative_path: String,
    pub storage_relative_path: String,
    pub size_bytes: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Artifacts that were "current" at the moment a prompt was submitted,
/// archived under the text of the *previous* prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHistoryEntry {
    pub prompt: String,
    pub artifact_ids: Vec<ArtifactId>,
    pub archived_at: chrono::DateTime<chrono::Utc>,
}

/// Cap on live artifacts per chat.
pub const MAX_ARTIFACTS: usize = 200;
/// Cap on archived prompt-history entries per chat.
pub const MAX_ARTIFACT_HISTORY: usize = 64;

/// An interactive, PTY-attached agent session bound to a project.
///
/// Invariants: (a) `status == Running` implies `pid` is a live
/// process owned by the hub, reconciled on every state-refresh pass; (b)
/// only hashes of live bearer tokens are persisted, never the plaintext;
/// (c) `ready_ack_guid` is the single accepted value for the *next*
/// readiness ack and rotates on every start; (d) `artifact_current_ids` is
/// always a subset of `artifacts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub project_id: ProjectId,
    pub name: String,
    pub profile: Option<String>,
    pub ro_mounts: Vec<String>,
    pub rw_mounts: Vec<String>,
    pub env_vars: Vec<String>,
    pub agent_args: Vec<String>,
    pub agent_type: AgentType,
    pub status: ChatStatus,
    pub status_reason: String,
    pub last_status_transition_at: chrono::DateTime<chrono::Utc>,
    pub pid: Option<u32>,
    pub workspace: Option<String>,
    pub container_workspace: Option<String>,
    pub setup_snapshot_image: Option<String>,
    pub start_error: Option<String>,
    pub last_exit_code: Option<i32>,
    pub last_exit_at: Option<chrono::DateTime<chrono::Utc>>,
    pub stop_requested_at: Option<chrono::DateTime<chrono::Utc>>,

    pub title_user_prompts: Vec<String>,
    pub title_cached: Option<String>,
    pub title_prompt_fingerprint: Option<String>,
    pub title_status: TitleStatus,
    pub title_error: Option<String>,

    pub artifacts: Vec<Artifact>,
    pub artifact_current_ids: Vec<ArtifactId>,
    pub artifact_prompt_history: Vec<ArtifactHistoryEntry>,
    pub artifact_publish_token_hash: Option<String>,

    pub agent_tools_token_hash: Option<String>,
    pub ready_ack_guid: Option<String>,
    pub ready_ack_stage: Option<ReadyAckStage>,
    pub ready_ack_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ready_ack_meta: Option<serde_json::Value>,

    pub create_request_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Chat {
    /// `artifact_current_ids ⊆ {a.id : a ∈ artifacts}`.
    pub fn artifact_ids_consistent(&self) -> bool {
        self.artifact_current_ids
            .iter()
            .all(|id| self.artifacts.iter().any(|a| &a.id == id))
    }

    /// Transition to a new status, recording the reason and timestamp
    /// ( status-machine table).
    pub fn transition(&mut self, status: ChatStatus, reason: impl Into<String>, now: chrono::DateTime<chrono::Utc>) {
        self.status = status;
        self.status_reason = reason.into();
        self.last_status_transition_at = now;
        self.updated_at = now;
    }

    pub fn is_running_with_live_pid_claim(&self) -> bool {
        self.status == ChatStatus::Running && self.pid.is_some()
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ChatBuilder => Chat {
        into {
            id: ChatId = ChatId::new(),
            project_id: ProjectId = ProjectId::new(),
            name: String = "chat",
            status_reason: String = "created",
        }
        set {
            profile: Option<String> = None,
            ro_mounts: Vec<String> = Vec::new(),
            rw_mounts: Vec<String> = Vec::new(),
            env_vars: Vec<String> = Vec::new(),
            agent_args: Vec<String> = Vec::new(),
            agent_type: AgentType = AgentType::Codex,
            status: ChatStatus = ChatStatus::Starting,
            pid: Option<u32> = None,
            workspace: Option<String> = None,
            container_workspace: Option<String> = None,
            setup_snapshot_image: Option<String> = None,
            start_error: Option<String> = None,
            last_exit_code: Option<i32> = None,
            last_exit_at: Option<chrono::DateTime<chrono::Utc>> = None,
            stop_requested_at: Option<chrono::DateTime<chrono::Utc>> = None,
            title_user_prompts: Vec<String> = Vec::new(),
            title_cached: Option<String> = None,
            title_prompt_fingerprint: Option<String> = None,
            title_status: TitleStatus = TitleStatus::Idle,
            title_error: Option<String> = None,
            artifacts: Vec<Artifact> = Vec::new(),
            artifact_current_ids: Vec<ArtifactId> = Vec::new(),
            artifact_prompt_history: Vec<ArtifactHistoryEntry> = Vec::new(),
            artifact_publish_token_hash: Option<String> = None,
            agent_tools_token_hash: Option<String> = None,
            ready_ack_guid: Option<String> = None,
            ready_ack_stage: Option<ReadyAckStage> = None,
            ready_ack_at: Option<chrono::DateTime<chrono::Utc>> = None,
            ready_ack_meta: Option<serde_json::Value> = None,
            create_request_id: Option<String> = None,
        }
        computed {
            last_status_transition_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
            created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
            updated_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
