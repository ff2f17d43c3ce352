// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Setup-snapshot fingerprinting.
//!
//! The build pipeline tags an image `agent-hub-setup-<project-suffix>-<digest>`
//! so two projects with identical build recipes can share a cache hit and so
//! re-running a build after a no-op edit is always skipped.

use crate::project::FingerprintInputs;
use sha2::{Digest, Sha256};

/// Truncated hex digest length used in image tags — long enough to make
/// collisions practically impossible for the number of projects this daemon
/// manages, short enough to stay inside Docker's tag length limit alongside
/// the project suffix.
const DIGEST_HEX_LEN: usize = 16;

/// Hash the fingerprint-relevant fields of a project's build recipe.
///
/// Canonicalizes through `serde_json` (stable key order via `BTreeMap`
/// during serialization is not needed here since `FingerprintInputs`'s field
/// order is fixed by its struct definition, and `serde_json` preserves
/// struct field order) so the same recipe always hashes identically
/// regardless of how it was constructed.
pub fn setup_snapshot_digest(inputs: &FingerprintInputs) -> String {
    let canonical = serde_json::to_vec(inputs).unwrap_or_else(|_| format!("{inputs:?}").into_bytes());
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let digest = hasher.finalize();
    hex::encode(digest)[..DIGEST_HEX_LEN].to_string()
}

/// Format the full image tag for a project's current build recipe.
pub fn setup_snapshot_tag(project_id_suffix: &str, inputs: &FingerprintInputs) -> String {
    format!("agent-hub-setup-{project_id_suffix}-{}", setup_snapshot_digest(inputs))
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
