// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::enums::BuildStatus;

#[test]
fn patch_that_changes_setup_script_resets_build_status() {
    let mut project = Project::builder()
        .build_status(BuildStatus::Ready)
        .setup_snapshot_image(Some("agent-hub-setup-abcd-0123456789abcdef".into()))
        .build();

    let changed = project.apply_patch(
        ProjectPatch { setup_script: Some("echo new".into()), ..Default::default() },
        chrono::Utc::now(),
    );

    assert!(changed);
    assert_eq!(project.build_status, BuildStatus::Pending);
    assert_eq!(project.setup_snapshot_image, None);
}

#[test]
fn patch_that_only_renames_does_not_reset_build_status() {
    let mut project = Project::builder().build_status(BuildStatus::Ready).build();

    let changed = project.apply_patch(
        ProjectPatch { name: Some("renamed".into()), ..Default::default() },
        chrono::Utc::now(),
    );

    assert!(!changed);
    assert_eq!(project.build_status, BuildStatus::Ready);
    assert_eq!(project.name, "renamed");
}

#[test]
fn patch_can_clear_default_branch() {
    let mut project = Project::builder().default_branch(Some("main".into())).build();
    let changed = project.apply_patch(
        ProjectPatch { default_branch: Some(None), ..Default::default() },
        chrono::Utc::now(),
    );
    assert!(changed);
    assert_eq!(project.default_branch, None);
}
