// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::command_runner::fake::FakeCommandRunner;

fn catalog_with(records: Vec<CredentialRecord>) -> HashMap<String, CredentialRecord> {
    records.into_iter().map(|r| (r.id.as_str().to_string(), r)).collect()
}

#[test]
fn single_binding_resolves_exactly_that_credential() {
    let cred = CredentialRecord::builder().id(CredentialId::from("abc")).build();
    let catalog = catalog_with(vec![cred]);
    let binding = BindingMode::Single { credential_id: "abc".to_string() };

    let resolved = resolve_candidates(&binding, &catalog);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id.as_str(), "abc");
}

#[test]
fn single_binding_on_missing_id_resolves_to_nothing() {
    let catalog = catalog_with(vec![]);
    let binding = BindingMode::Single { credential_id: "missing".to_string() };
    assert!(resolve_candidates(&binding, &catalog).is_empty());
}

#[test]
fn set_binding_preserves_requested_ids_that_exist() {
    let a = CredentialRecord::builder().id(CredentialId::from("a")).build();
    let b = CredentialRecord::builder().id(CredentialId::from("b")).build();
    let catalog = catalog_with(vec![a, b]);
    let binding = BindingMode::Set { credential_ids: vec!["a".to_string(), "missing".to_string(), "b".to_string()] };

    let resolved = resolve_candidates(&binding, &catalog);
    assert_eq!(resolved.len(), 2);
}

#[test]
fn auto_binding_excludes_known_bad_credentials() {
    let mut good = CredentialRecord::builder().id(CredentialId::from("good")).build();
    good.last_probe_ok = Some(true);
    let mut bad = CredentialRecord::builder().id(CredentialId::from("bad")).build();
    bad.last_probe_ok = Some(false);
    let catalog = catalog_with(vec![good, bad]);

    let resolved = resolve_candidates(&BindingMode::Auto, &catalog);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id.as_str(), "good");
}

#[test]
fn all_binding_returns_every_entry_sorted_by_id() {
    let a = CredentialRecord::builder().id(CredentialId::from("zzz")).build();
    let b = CredentialRecord::builder().id(CredentialId::from("aaa")).build();
    let catalog = catalog_with(vec![a, b]);

    let resolved = resolve_candidates(&BindingMode::All, &catalog);
    assert_eq!(resolved.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["aaa", "zzz"]);
}

#[tokio::test]
async fn probe_credential_succeeds_on_zero_exit() {
    let runner = FakeCommandRunner::always_ok();
    let env = HashMap::new();
    probe_credential(&runner, "https://github.com/example/repo.git", &env).await.unwrap();
}

#[tokio::test]
async fn probe_credential_surfaces_credential_resolution_error_on_nonzero_exit() {
    let runner = FakeCommandRunner::always_fail("fatal: authentication failed");
    let env = HashMap::new();
    let err = probe_credential(&runner, "https://github.com/example/repo.git", &env).await.unwrap_err();
    assert_eq!(err.code(), "CREDENTIAL_RESOLUTION_ERROR");
}

#[test]
fn materialize_credential_file_is_owner_only_and_contains_secret() {
    let dir = tempfile::tempdir().unwrap();
    let id = CredentialId::from("abc123");
    let path = materialize_credential_file(dir.path(), &id, "s3cr3t").unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "s3cr3t");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}

#[test]
fn git_env_for_credential_points_at_the_materialized_file() {
    let path = Path::new("/data/credentials/abc123");
    let env = git_env_for_credential(path);
    assert_eq!(env.get("AGENT_HUB_CREDENTIAL_FILE").unwrap(), "/data/credentials/abc123");
    assert_eq!(env.get("GIT_TERMINAL_PROMPT").unwrap(), "0");
}
