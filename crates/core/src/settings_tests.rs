// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn apply_patch_reports_no_change_for_empty_patch() {
    let mut settings = Settings::default();
    let changed = settings.apply_patch(SettingsPatch::default(), chrono::Utc::now());
    assert!(!changed);
}

#[test]
fn apply_patch_can_set_and_clear_identity_uid() {
    let mut settings = Settings::default();
    let now = chrono::Utc::now();

    let changed = settings.apply_patch(
        SettingsPatch { identity_uid: Some(Some(1000)), ..Default::default() },
        now,
    );
    assert!(changed);
    assert_eq!(settings.identity_uid, Some(1000));
    assert_eq!(settings.updated_at, now);

    let changed = settings.apply_patch(
        SettingsPatch { identity_uid: Some(None), ..Default::default() },
        now,
    );
    assert!(changed);
    assert_eq!(settings.identity_uid, None);
}

#[test]
fn validate_identity_rejects_uid_without_gid() {
    let mut settings = Settings::default();
    settings.identity_uid = Some(1000);
    assert!(settings.validate_identity().is_err());
}

#[test]
fn validate_identity_accepts_both_set_or_both_unset() {
    let settings = Settings::default();
    assert!(settings.validate_identity().is_ok());

    let mut settings = Settings::default();
    settings.identity_uid = Some(1000);
    settings.identity_gid = Some(1000);
    assert!(settings.validate_identity().is_ok());
}
