// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime identity resolution.
//!
//! The uid/gid agent containers run as is resolved through an ordered
//! fallback chain: explicit settings, then environment overrides, then the
//! owner of the shared mount root, then this process's own credentials.
//! The first source that provides *either* a uid or a gid wins outright —
//! sources are never blended, so a uid from settings is never paired with
//! a gid discovered from `stat()`.

use agent_hub_core::{parse_non_negative_int, HubError, HubResult, Settings};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub uid: u32,
    pub gid: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PartialIdentity {
    uid: Option<u32>,
    gid: Option<u32>,
}

impl PartialIdentity {
    fn complete(self) -> HubResult<Option<ResolvedIdentity>> {
        match (self.uid, self.gid) {
            (Some(uid), Some(gid)) => Ok(Some(ResolvedIdentity { uid, gid })),
            (None, None) => Ok(None),
            _ => Err(HubError::identity(
                "identity source provided a uid without a gid (or vice versa); \
                 a partial identity is never completed from a different source",
            )),
        }
    }
}

const ENV_UID: &str = "AGENT_HUB_IDENTITY_UID";
const ENV_GID: &str = "AGENT_HUB_IDENTITY_GID";

fn from_settings(settings: &Settings) -> PartialIdentity {
    PartialIdentity { uid: settings.identity_uid, gid: settings.identity_gid }
}

fn from_env(env: &HashMap<String, String>) -> HubResult<PartialIdentity> {
    let uid = env.get(ENV_UID).map(|v| parse_non_negative_int(v, ENV_UID)).transpose()?;
    let gid = env.get(ENV_GID).map(|v| parse_non_negative_int(v, ENV_GID)).transpose()?;
    Ok(PartialIdentity { uid, gid })
}

#[cfg(unix)]
fn from_shared_root_stat(shared_root: &Path) -> PartialIdentity {
    use std::os::unix::fs::MetadataExt;
    match std::fs::metadata(shared_root) {
        Ok(meta) => PartialIdentity { uid: Some(meta.uid()), gid: Some(meta.gid()) },
        Err(_) => PartialIdentity { uid: None, gid: None },
    }
}

#[cfg(not(unix))]
fn from_shared_root_stat(_shared_root: &Path) -> PartialIdentity {
    PartialIdentity { uid: None, gid: None }
}

#[cfg(unix)]
fn from_process_credentials() -> PartialIdentity {
    PartialIdentity { uid: Some(nix::unistd::getuid().as_raw()), gid: Some(nix::unistd::getgid().as_raw()) }
}

#[cfg(not(unix))]
fn from_process_credentials() -> PartialIdentity {
    PartialIdentity { uid: None, gid: None }
}

/// Resolve the identity agent containers should run as.
///
/// Falls through explicit settings, env overrides, the shared mount root's
/// owner, and finally this process's own uid/gid. The chain always
/// terminates in `Ok` on a Unix host, since process credentials are always
/// available as the last resort.
pub fn resolve_identity(
    settings: &Settings,
    env: &HashMap<String, String>,
    shared_root: &Path,
) -> HubResult<ResolvedIdentity> {
    for candidate in [from_settings(settings), from_env(env)?, from_shared_root_stat(shared_root), from_process_credentials()] {
        if let Some(resolved) = candidate.complete()? {
            return Ok(resolved);
        }
    }
    Err(HubError::identity("no identity source produced a usable uid/gid pair"))
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
