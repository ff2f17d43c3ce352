// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single materialized state snapshot.
//!
//! Unlike a WAL-backed event-sourced store, `State` is the entire durable
//! picture of the daemon: one JSON document holding every project, chat,
//! and the global settings. There is no replay — a write replaces the
//! document atomically and that's the whole story.

use agent_hub_core::{Chat, CredentialRecord, Project, ProjectId, Settings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current schema version. Bump when a field's meaning changes in a way
/// that requires a migration rather than a `#[serde(default)]`.
pub const CURRENT_STATE_VERSION: u32 = 1;

/// Keyed by `ProjectId`/`ChatId`/`CredentialId`'s string form, mirroring
/// how every other id-keyed map in this codebase is represented on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(default)]
    pub projects: HashMap<String, Project>,
    #[serde(default)]
    pub chats: HashMap<String, Chat>,
    /// Credential Broker catalog metadata — never the secret
    /// material itself, which lives in files under the data directory.
    #[serde(default)]
    pub credentials: HashMap<String, CredentialRecord>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: CURRENT_STATE_VERSION,
            projects: HashMap::new(),
            chats: HashMap::new(),
            credentials: HashMap::new(),
            settings: Settings::default(),
        }
    }
}

impl State {
    /// Coerce anything the loader can recover without operator intervention,
    /// and report whether anything changed. The store rewrites the file
    /// when this returns `true` so the on-disk copy never drifts from what
    /// the daemon actually believes.
    ///
    /// Idempotent: running this twice in a row always returns `false` the
    /// second time.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        for chat in self.chats.values_mut() {
            if chat.status.is_terminal() && chat.pid.is_some() {
                // A terminal chat can never carry a live pid claim; a crash
                // between "process exited" and "pid cleared" is the only way
                // to reach this state, so normalization clears it.
                chat.pid = None;
                changed = true;
            }

            if !chat.artifact_ids_consistent() {
                chat.artifact_current_ids.retain(|id| chat.artifacts.iter().any(|a| &a.id == id));
                changed = true;
            }
        }

        if self.version != CURRENT_STATE_VERSION {
            self.version = CURRENT_STATE_VERSION;
            changed = true;
        }

        changed
    }

    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.values().find(|p| p.name == name)
    }

    pub fn chats_for_project(&self, project_id: &ProjectId) -> impl Iterator<Item = &Chat> {
        self.chats.values().filter(move |c| c.project_id == *project_id)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
