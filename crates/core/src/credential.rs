// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential catalog entries.
//!
//! A [`CredentialRecord`] is catalog metadata only — provider, scope, and the
//! last probe result. The secret material itself (PAT, GitHub App private
//! key) never round-trips through the state store; it lives in files the
//! Credential Broker materializes under the data directory with `0600`
//! permissions, named by [`CredentialId`].

use crate::enums::{CredentialKind, Provider};
use crate::ids::CredentialId;
use serde::{Deserialize, Serialize};

/// One entry in the Credential Broker's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: CredentialId,
    pub kind: CredentialKind,
    pub provider: Provider,
    pub label: String,
    /// `host[:port]` this credential is scoped to, or empty for the
    /// provider's default host ( host-scoping rule).
    pub host: String,
    /// GitHub App installation id, set only when `kind == GithubAppInstallation`.
    pub installation_id: Option<u64>,
    pub last_probed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_probe_ok: Option<bool>,
    pub last_probe_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl CredentialRecord {
    /// Record the outcome of a `git ls-remote` probe.
    pub fn record_probe(&mut self, ok: bool, error: Option<String>, now: chrono::DateTime<chrono::Utc>) {
        self.last_probed_at = Some(now);
        self.last_probe_ok = Some(ok);
        self.last_probe_error = error;
        self.updated_at = now;
    }
}

/// Mint a new opaque credential id for a PAT connected at runtime.
pub fn new_pat_credential_id() -> CredentialId {
    let raw: [u8; 16] = rand::random();
    CredentialId::from(hex::encode(raw))
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct CredentialRecordBuilder => CredentialRecord {
        into {
            id: CredentialId = CredentialId::from("cred-test"),
            label: String = "test credential",
        }
        set {
            kind: CredentialKind = CredentialKind::PersonalAccessToken,
            provider: Provider = Provider::Github,
            host: String = String::new(),
            installation_id: Option<u64> = None,
            last_probed_at: Option<chrono::DateTime<chrono::Utc>> = None,
            last_probe_ok: Option<bool> = None,
            last_probe_error: Option<String> = None,
        }
        computed {
            created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
            updated_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
