// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::Settings;

fn empty_env() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn explicit_settings_win_over_everything_else() {
    let mut settings = Settings::default();
    settings.identity_uid = Some(5000);
    settings.identity_gid = Some(5000);

    let mut env = empty_env();
    env.insert(ENV_UID.to_string(), "9999".into());
    env.insert(ENV_GID.to_string(), "9999".into());

    let resolved = resolve_identity(&settings, &env, Path::new("/nonexistent")).unwrap();
    assert_eq!(resolved, ResolvedIdentity { uid: 5000, gid: 5000 });
}

#[test]
fn env_override_used_when_settings_are_unset() {
    let settings = Settings::default();
    let mut env = empty_env();
    env.insert(ENV_UID.to_string(), "1234".into());
    env.insert(ENV_GID.to_string(), "1234".into());

    let resolved = resolve_identity(&settings, &env, Path::new("/nonexistent")).unwrap();
    assert_eq!(resolved, ResolvedIdentity { uid: 1234, gid: 1234 });
}

#[test]
fn settings_uid_without_gid_is_an_identity_error() {
    let mut settings = Settings::default();
    settings.identity_uid = Some(5000);

    let err = resolve_identity(&settings, &empty_env(), Path::new("/nonexistent")).unwrap_err();
    assert_eq!(err.code(), "IDENTITY_ERROR");
}

#[test]
fn env_uid_without_gid_is_an_identity_error() {
    let mut env = empty_env();
    env.insert(ENV_UID.to_string(), "42".into());

    let err = resolve_identity(&Settings::default(), &env, Path::new("/nonexistent")).unwrap_err();
    assert_eq!(err.code(), "IDENTITY_ERROR");
}

#[test]
fn falls_through_to_process_credentials_when_everything_else_is_absent() {
    let resolved = resolve_identity(&Settings::default(), &empty_env(), Path::new("/nonexistent")).unwrap();
    // On any Unix CI host this resolves to the test runner's own uid/gid.
    assert_eq!(resolved.uid, nix::unistd::getuid().as_raw());
}

#[test]
fn shared_root_stat_is_used_when_settings_and_env_are_both_absent() {
    let dir = tempfile::tempdir().unwrap();
    let resolved = resolve_identity(&Settings::default(), &empty_env(), dir.path()).unwrap();
    use std::os::unix::fs::MetadataExt;
    let meta = std::fs::metadata(dir.path()).unwrap();
    assert_eq!(resolved.uid, meta.uid());
    assert_eq!(resolved.gid, meta.gid());
}
