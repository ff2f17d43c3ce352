// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::command_runner::fake::FakeCommandRunner;
use agent_hub_core::{CredentialRecord, Provider};

fn github_record(id: &str, host: &str) -> CredentialRecord {
    let mut record = CredentialRecord::builder().id(CredentialId::from(id)).build();
    record.provider = Provider::Github;
    record.host = host.to_string();
    record
}

struct AlwaysSecret;

#[async_trait::async_trait]
impl SecretResolver for AlwaysSecret {
    async fn resolve_secret(&self, _credential_id: &CredentialId) -> HubResult<String> {
        Ok("test-secret".to_string())
    }
}

#[test]
fn parse_repo_host_scheme_handles_https_url() {
    let parsed = parse_repo_host_scheme("https://example.com/org/repo.git").unwrap();
    assert_eq!(parsed.host, "example.com");
    assert_eq!(parsed.scheme.as_deref(), Some("https"));
}

#[test]
fn parse_repo_host_scheme_handles_scp_like_syntax() {
    let parsed = parse_repo_host_scheme("git@example.com:org/repo.git").unwrap();
    assert_eq!(parsed.host, "example.com");
    assert_eq!(parsed.scheme, None);
}

#[tokio::test]
async fn auto_mode_resolves_to_the_first_verified_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = [github_record("good", "example.com"), github_record("bad", "example.com")]
        .into_iter()
        .map(|r| (r.id.as_str().to_string(), r))
        .collect::<HashMap<_, _>>();

    let runner = FakeCommandRunner::always_ok();
    let resolved =
        resolve_for_repository(&runner, &AlwaysSecret, dir.path(), "https://example.com/org/repo.git", &BindingMode::Auto, &catalog)
            .await
            .unwrap();
    assert_eq!(resolved.len(), 2);
}

#[tokio::test]
async fn auto_mode_errors_when_no_candidate_matches_host() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = [github_record("good", "other.example.com")].into_iter().map(|r| (r.id.as_str().to_string(), r)).collect();

    let runner = FakeCommandRunner::always_ok();
    let err = resolve_for_repository(&runner, &AlwaysSecret, dir.path(), "https://example.com/org/repo.git", &BindingMode::Auto, &catalog)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CREDENTIAL_RESOLUTION_ERROR");
}

#[tokio::test]
async fn auto_mode_errors_when_every_candidate_fails_the_probe() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = [github_record("bad", "example.com")].into_iter().map(|r| (r.id.as_str().to_string(), r)).collect();

    let runner = FakeCommandRunner::always_fail("authentication failed");
    let err = resolve_for_repository(&runner, &AlwaysSecret, dir.path(), "https://example.com/org/repo.git", &BindingMode::Auto, &catalog)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CREDENTIAL_RESOLUTION_ERROR");
}

#[tokio::test]
async fn single_binding_skips_probing_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = [github_record("only", "example.com")].into_iter().map(|r| (r.id.as_str().to_string(), r)).collect();

    let runner = FakeCommandRunner::always_fail("would fail if probed");
    let binding = BindingMode::Single { credential_id: "only".to_string() };
    let resolved =
        resolve_for_repository(&runner, &AlwaysSecret, dir.path(), "https://example.com/org/repo.git", &binding, &catalog).await.unwrap();
    assert_eq!(resolved, vec![CredentialId::from("only")]);
}
