// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::enums::BaseImageMode;

fn inputs(setup_script: &str) -> FingerprintInputs {
    FingerprintInputs {
        default_branch: Some("main".into()),
        repo_head_sha: Some("abc123".into()),
        setup_script: setup_script.into(),
        base_image_mode: BaseImageMode::Tag,
        base_image_value: "ubuntu:24.04".into(),
        default_ro_mounts: Vec::new(),
        default_rw_mounts: Vec::new(),
        default_env_vars: Vec::new(),
    }
}

#[test]
fn identical_inputs_hash_identically() {
    assert_eq!(setup_snapshot_digest(&inputs("echo ok")), setup_snapshot_digest(&inputs("echo ok")));
}

#[test]
fn different_setup_scripts_hash_differently() {
    assert_ne!(setup_snapshot_digest(&inputs("echo ok")), setup_snapshot_digest(&inputs("echo other")));
}

#[test]
fn digest_is_truncated_hex() {
    let digest = setup_snapshot_digest(&inputs("echo ok"));
    assert_eq!(digest.len(), DIGEST_HEX_LEN);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn tag_embeds_project_suffix_and_digest() {
    let tag = setup_snapshot_tag("0123456789abcdef", &inputs("echo ok"));
    assert!(tag.starts_with("agent-hub-setup-0123456789abcdef-"));
    assert_eq!(tag.len(), "agent-hub-setup-".len() + 16 + 1 + DIGEST_HEX_LEN);
}
