// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-wide settings.
//!
//! Unlike [`crate::project::Project`] and [`crate::chat::Chat`], there is
//! exactly one `Settings` value, stored alongside projects and chats in the
//! state snapshot. `PATCH /api/settings` merges a sparse [`SettingsPatch`]
//! the same way a project patch merges, just without a fingerprint to reset.

use crate::enums::BindingMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// uid the container runtime launches agent processes as, when set
    /// explicitly rather than falling back to the identity-resolution chain.
    pub identity_uid: Option<u32>,
    pub identity_gid: Option<u32>,
    #[serde(default)]
    pub identity_supplementary_gids: Vec<u32>,
    #[serde(default = "BindingMode::default_auto")]
    pub default_credential_binding: BindingMode,
    /// Candidate hosts the OAuth Callback Relay tries, in priority order.
    /// Empty means "use the built-in candidate list".
    #[serde(default)]
    pub callback_relay_hosts: Vec<String>,
    #[serde(default = "default_title_generation_enabled")]
    pub title_generation_enabled: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

fn default_title_generation_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity_uid: None,
            identity_gid: None,
            identity_supplementary_gids: Vec::new(),
            default_credential_binding: BindingMode::default_auto(),
            callback_relay_hosts: Vec::new(),
            title_generation_enabled: true,
            updated_at: chrono::Utc::now(),
        }
    }
}

impl Settings {
    /// Apply a sparse PATCH, returning whether anything actually changed so
    /// callers can skip an unnecessary state-store write.
    pub fn apply_patch(&mut self, patch: SettingsPatch, now: chrono::DateTime<chrono::Utc>) -> bool {
        let before = self.clone();

        if let Some(uid) = patch.identity_uid {
            self.identity_uid = uid;
        }
        if let Some(gid) = patch.identity_gid {
            self.identity_gid = gid;
        }
        if let Some(gids) = patch.identity_supplementary_gids {
            self.identity_supplementary_gids = gids;
        }
        if let Some(binding) = patch.default_credential_binding {
            self.default_credential_binding = binding;
        }
        if let Some(hosts) = patch.callback_relay_hosts {
            self.callback_relay_hosts = hosts;
        }
        if let Some(enabled) = patch.title_generation_enabled {
            self.title_generation_enabled = enabled;
        }

        let changed = *self != before;
        if changed {
            self.updated_at = now;
        }
        changed
    }

    /// An explicit uid without a gid is a hard error: identity
    /// configuration is never silently completed by guessing a gid.
    pub fn validate_identity(&self) -> Result<(), crate::error::HubError> {
        match (self.identity_uid, self.identity_gid) {
            (Some(_), None) | (None, Some(_)) => Err(crate::error::HubError::identity(
                "identity_uid and identity_gid must both be set or both be unset",
            )),
            _ => Ok(()),
        }
    }
}

/// Sparse PATCH body for `PATCH /api/settings`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub identity_uid: Option<Option<u32>>,
    #[serde(default)]
    pub identity_gid: Option<Option<u32>>,
    pub identity_supplementary_gids: Option<Vec<u32>>,
    pub default_credential_binding: Option<BindingMode>,
    pub callback_relay_hosts: Option<Vec<String>>,
    pub title_generation_enabled: Option<bool>,
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
