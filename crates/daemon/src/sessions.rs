// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry of ephemeral `agent_tools` sessions — the same
//! callback surface a chat exposes, but for one-shot tool invocations
//! (auto-configure analysis) that have no persisted [`Chat`] backing them.
//! Mirrors [`agent_hub_engine::ChatRuntimeRegistry`]'s shape: a
//! `parking_lot`-guarded map, cloneable handle, no persistence.

use agent_hub_core::{AgentToolsSession, OAuthLoginSession};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct AgentToolsSessionRegistry {
    sessions: Arc<Mutex<HashMap<String, AgentToolsSession>>>,
}

impl AgentToolsSessionRegistry {
    pub fn insert(&self, session: AgentToolsSession) {
        self.sessions.lock().insert(session.id.as_str().to_string(), session);
    }

    pub fn get(&self, id: &str) -> Option<AgentToolsSession> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn update(&self, id: &str, f: impl FnOnce(&mut AgentToolsSession)) -> Option<AgentToolsSession> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(id)?;
        f(session);
        Some(session.clone())
    }

    pub fn remove(&self, id: &str) -> Option<AgentToolsSession> {
        self.sessions.lock().remove(id)
    }

    /// Drop every session whose TTL has passed.
    pub fn sweep_expired(&self, now: chrono::DateTime<chrono::Utc>) {
        self.sessions.lock().retain(|_, s| !s.is_expired(now));
    }
}

/// In-memory registry of [`OAuthLoginSession`]s backing the OpenAI ChatGPT
/// account connect flow and the GitHub App manifest setup flow. Same shape
/// as [`AgentToolsSessionRegistry`] — these never touch the state store.
#[derive(Clone, Default)]
pub struct OAuthLoginSessionRegistry {
    sessions: Arc<Mutex<HashMap<String, OAuthLoginSession>>>,
}

impl OAuthLoginSessionRegistry {
    pub fn insert(&self, session: OAuthLoginSession) {
        self.sessions.lock().insert(session.id.as_str().to_string(), session);
    }

    pub fn get(&self, id: &str) -> Option<OAuthLoginSession> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn update(&self, id: &str, f: impl FnOnce(&mut OAuthLoginSession)) -> Option<OAuthLoginSession> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(id)?;
        f(session);
        Some(session.clone())
    }

    pub fn remove(&self, id: &str) -> Option<OAuthLoginSession> {
        self.sessions.lock().remove(id)
    }

    /// Drop every session that reached a terminal state more than an hour
    /// ago, so a forgotten setup flow doesn't linger forever.
    pub fn sweep_stale(&self, now: chrono::DateTime<chrono::Utc>) {
        self.sessions.lock().retain(|_, s| !s.is_terminal() || now - s.updated_at < chrono::Duration::hours(1));
    }
}
