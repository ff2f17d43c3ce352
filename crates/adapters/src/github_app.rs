// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub App JWT minting and installation-token caching. Grounded on the octocat JWT-signing
//! pattern of clock-drift allowance + fixed token lifetime, adapted to the
//! `jsonwebtoken` crate instead of that example's `jaws`/`hyperdriver` stack.

use agent_hub_core::{HubError, HubResult};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// GitHub backdates `iat` and caps the JWT lifetime at 10 minutes; the hub
/// stays well inside both bounds.
const CLOCK_DRIFT_OFFSET_SECONDS: i64 = 30;
const TOKEN_DURATION_SECONDS: i64 = 9 * 60;

/// How long before an installation token's real expiry the cache treats it
/// as already expired, so a request never races the upstream's clock.
const REFRESH_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Debug, Clone)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl InstallationToken {
    pub fn is_usable(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now + chrono::Duration::seconds(REFRESH_SKEW_SECONDS) < self.expires_at
    }
}

/// Mints JWTs for a single GitHub App and caches installation tokens keyed
/// by installation id.
pub struct GithubAppClient {
    app_id: String,
    private_key_pem: Vec<u8>,
    installation_tokens: Mutex<HashMap<u64, InstallationToken>>,
}

impl GithubAppClient {
    pub fn new(app_id: impl Into<String>, private_key_pem: Vec<u8>) -> Self {
        Self { app_id: app_id.into(), private_key_pem, installation_tokens: Mutex::new(HashMap::new()) }
    }

    /// Sign a fresh App-level JWT (`iss`-authenticated, used for
    /// `/app/installations` and manifest conversion, not for repo access).
    pub fn mint_app_jwt(&self, now: chrono::DateTime<chrono::Utc>) -> HubResult<String> {
        let claims = AppClaims {
            iat: now.timestamp() - CLOCK_DRIFT_OFFSET_SECONDS,
            exp: now.timestamp() + TOKEN_DURATION_SECONDS,
            iss: self.app_id.clone(),
        };
        let key = EncodingKey::from_rsa_pem(&self.private_key_pem)
            .map_err(|e| HubError::config(format!("invalid GitHub App private key: {e}")))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| HubError::config(format!("failed to sign App JWT: {e}")))
    }

    /// Return a cached installation token if it is still fresh, or `None`
    /// if the caller needs to fetch and then [`cache_installation_token`].
    pub fn cached_installation_token(&self, installation_id: u64, now: chrono::DateTime<chrono::Utc>) -> Option<InstallationToken> {
        let tokens = self.installation_tokens.lock();
        tokens.get(&installation_id).filter(|t| t.is_usable(now)).cloned()
    }

    pub fn cache_installation_token(&self, installation_id: u64, token: InstallationToken) {
        self.installation_tokens.lock().insert(installation_id, token);
    }
}

#[cfg(test)]
#[path = "github_app_tests.rs"]
mod tests;
