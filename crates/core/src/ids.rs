// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identifiers.
//!
//! `ProjectId`/`ChatId`/`ArtifactId`/`AgentToolsSessionId`/`OAuthLoginSessionId`
//! reuse the [`crate::define_id!`] scheme (4-char prefix + 19-char nanoid).
//! `CredentialId` does not: its shape is fixed (`github_app:<installation_id>`
//! or an opaque hex digest assigned at connect time), so it is a plain
//! string newtype instead of a generated ID.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

crate::define_id! {
    /// Identifies a registered project (git remote + build recipe).
    pub struct ProjectId("proj-");
}

crate::define_id! {
    /// Identifies one interactive agent chat session.
    pub struct ChatId("chat-");
}

crate::define_id! {
    /// Identifies one artifact published by a chat or agent_tools session.
    pub struct ArtifactId("arti-");
}

crate::define_id! {
    /// Identifies an ephemeral, in-memory agent_tools session not backed by a chat.
    pub struct AgentToolsSessionId("asess-");
}

crate::define_id! {
    /// Identifies an in-memory OAuth login session (login container + relay state).
    pub struct OAuthLoginSessionId("olog-");
}

/// Identifies a catalog entry in the credential broker.
///
/// For a GitHub App installation this is `github_app:<installation_id>`; for
/// a PAT it is an opaque hex digest minted at connect time (see
/// [`crate::credential::new_pat_credential_id`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub String);

impl CredentialId {
    pub fn github_app(installation_id: impl fmt::Display) -> Self {
        Self(format!("github_app:{installation_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CredentialId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CredentialId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for CredentialId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
