// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ephemeral `agent_tools` session records.
//!
//! Unlike [`crate::chat::Chat`], these are not persisted in the state
//! snapshot: they live only in the daemon's in-memory registry for the
//! lifetime of a single agent_tools invocation (a one-shot tool call that
//! needs a scratch workspace and a bearer token, not a long-running PTY).

use crate::ids::{AgentToolsSessionId, ProjectId};
use serde::{Deserialize, Serialize};

/// One live `agent_tools` session: a scratch workspace bound to a project,
/// reachable only with its bearer token, torn down when the session ends or
/// the daemon restarts (sessions never survive a reconciliation pass).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentToolsSession {
    pub id: AgentToolsSessionId,
    pub project_id: ProjectId,
    pub workspace: String,
    pub token_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl AgentToolsSession {
    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct AgentToolsSessionBuilder => AgentToolsSession {
        into {
            id: AgentToolsSessionId = AgentToolsSessionId::new(),
            project_id: ProjectId = ProjectId::new(),
            workspace: String = "/tmp/agent-hub-test-workspace",
            token_hash: String = "deadbeef",
        }
        computed {
            created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
            expires_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now() + chrono::Duration::minutes(30),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
