// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project record.

use crate::enums::{BaseImageMode, BindingMode, BuildStatus};
use crate::ids::ProjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A registered project: a git remote plus a build recipe.
///
/// Invariant: `build_status == Ready` implies
/// `setup_snapshot_image == Some(fingerprint(self))` and that image exists
/// in the container runtime. Any edit to a fingerprint input must reset
/// `build_status` to `Pending`, clear `setup_snapshot_image`, and schedule a
/// build — callers use [`Project::apply_patch`] rather than mutating fields
/// directly so this invariant can't be skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub repo_url: String,
    pub default_branch: Option<String>,
    pub setup_script: String,
    pub base_image_mode: BaseImageMode,
    pub base_image_value: String,
    #[serde(default)]
    pub default_ro_mounts: Vec<String>,
    #[serde(default)]
    pub default_rw_mounts: Vec<String>,
    #[serde(default)]
    pub default_env_vars: Vec<String>,
    #[serde(default = "BindingMode::default_auto")]
    pub credential_binding: BindingMode,
    pub repo_head_sha: Option<String>,
    pub setup_snapshot_image: Option<String>,
    pub build_status: BuildStatus,
    pub build_error: Option<String>,
    pub build_started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub build_finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl BindingMode {
    pub fn default_auto() -> Self {
        BindingMode::Auto
    }
}

/// Fields of [`Project`] that feed [`crate::fingerprint::setup_snapshot_fingerprint`].
///
/// A change to any of these must reset `build_status` to `Pending`;
/// grouping them here lets the build scheduler compare "did a fingerprint
/// input change" without re-deriving the full fingerprint on every edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintInputs {
    pub default_branch: Option<String>,
    pub repo_head_sha: Option<String>,
    pub setup_script: String,
    pub base_image_mode: BaseImageMode,
    pub base_image_value: String,
    pub default_ro_mounts: Vec<String>,
    pub default_rw_mounts: Vec<String>,
    pub default_env_vars: Vec<String>,
}

impl Project {
    pub fn fingerprint_inputs(&self) -> FingerprintInputs {
        FingerprintInputs {
            default_branch: self.default_branch.clone(),
            repo_head_sha: self.repo_head_sha.clone(),
            setup_script: self.setup_script.clone(),
            base_image_mode: self.base_image_mode,
            base_image_value: self.base_image_value.clone(),
            default_ro_mounts: self.default_ro_mounts.clone(),
            default_rw_mounts: self.default_rw_mounts.clone(),
            default_env_vars: self.default_env_vars.clone(),
        }
    }

    /// Apply a sparse PATCH. Returns whether any fingerprint input changed,
    /// so the caller (the state store mutation in `agent-hub-storage`) knows
    /// whether to reset the build status and schedule a rebuild.
    pub fn apply_patch(&mut self, patch: ProjectPatch, now: chrono::DateTime<chrono::Utc>) -> bool {
        let before = self.fingerprint_inputs();

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(repo_url) = patch.repo_url {
            self.repo_url = repo_url;
        }
        if let Some(default_branch) = patch.default_branch {
            self.default_branch = default_branch;
        }
        if let Some(setup_script) = patch.setup_script {
            self.setup_script = setup_script;
        }
        if let Some(mode) = patch.base_image_mode {
            self.base_image_mode = mode;
        }
        if let Some(value) = patch.base_image_value {
            self.base_image_value = value;
        }
        if let Some(mounts) = patch.default_ro_mounts {
            self.default_ro_mounts = mounts;
        }
        if let Some(mounts) = patch.default_rw_mounts {
            self.default_rw_mounts = mounts;
        }
        if let Some(vars) = patch.default_env_vars {
            self.default_env_vars = vars;
        }
        if let Some(binding) = patch.credential_binding {
            self.credential_binding = binding;
        }

        self.updated_at = now;

        let fingerprint_changed = self.fingerprint_inputs() != before;
        if fingerprint_changed {
            self.build_status = BuildStatus::Pending;
            self.setup_snapshot_image = None;
            self.build_error = None;
        }
        fingerprint_changed
    }
}

/// Sparse PATCH body for `PATCH /api/projects/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub repo_url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<Option<String>>,
    pub setup_script: Option<String>,
    pub base_image_mode: Option<BaseImageMode>,
    pub base_image_value: Option<String>,
    pub default_ro_mounts: Option<Vec<String>>,
    pub default_rw_mounts: Option<Vec<String>>,
    pub default_env_vars: Option<Vec<String>>,
    pub credential_binding: Option<BindingMode>,
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ProjectBuilder => Project {
        into {
            id: ProjectId = ProjectId::new(),
            name: String = "demo",
            repo_url: String = "https://example.invalid/demo.git",
            setup_script: String = "echo ok",
            base_image_value: String = "ubuntu:24.04",
        }
        set {
            default_branch: Option<String> = None,
            base_image_mode: BaseImageMode = BaseImageMode::Tag,
            default_ro_mounts: Vec<String> = Vec::new(),
            default_rw_mounts: Vec<String> = Vec::new(),
            default_env_vars: Vec<String> = Vec::new(),
            credential_binding: BindingMode = BindingMode::Auto,
            repo_head_sha: Option<String> = None,
            setup_snapshot_image: Option<String> = None,
            build_status: BuildStatus = BuildStatus::Pending,
            build_error: Option<String> = None,
            build_started_at: Option<chrono::DateTime<chrono::Utc>> = None,
            build_finished_at: Option<chrono::DateTime<chrono::Utc>> = None,
        }
        computed {
            created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
            updated_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
