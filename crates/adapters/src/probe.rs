// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full per-repository credential resolution: host/scheme filtering,
//! binding-mode ordering, and the `auto` mode's probe-then-verify pass over
//! candidate credentials.

use crate::command_runner::CommandRunner;
use crate::credential_broker::{git_env_for_credential, materialize_credential_file, probe_credential, resolve_candidates};
use agent_hub_core::{BindingMode, CredentialId, CredentialRecord, HubError, HubResult};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

/// Resolves a credential's plaintext secret. Implemented by the daemon
/// against its on-disk secret store; kept as a trait here so the probe can
/// materialize a credential's *real* secret rather than a placeholder
/// before verifying it with `git ls-remote`.
#[async_trait::async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve_secret(&self, credential_id: &CredentialId) -> HubResult<String>;
}

/// Parsed `host`, and `scheme` when the repo URL is http(s) — anything else
/// (e.g. `git@host:org/repo.git`) keeps every host match regardless of scheme.
pub struct RepoHostScheme {
    pub host: String,
    pub scheme: Option<String>,
}

pub fn parse_repo_host_scheme(repo_url: &str) -> HubResult<RepoHostScheme> {
    if let Ok(url) = Url::parse(repo_url) {
        let host = url.host_str().ok_or_else(|| HubError::config(format!("repo URL has no host: {repo_url}")))?;
        let scheme = if url.scheme() == "http" || url.scheme() == "https" { Some(url.scheme().to_string()) } else { None };
        return Ok(RepoHostScheme { host: host.to_string(), scheme });
    }

    // scp-like syntax: git@host:org/repo.git
    if let Some((_, rest)) = repo_url.split_once('@') {
        if let Some((host, _)) = rest.split_once(':') {
            return Ok(RepoHostScheme { host: host.to_string(), scheme: None });
        }
    }

    Err(HubError::config(format!("could not parse host from repo URL: {repo_url}")))
}

fn matches_host_and_scheme(record: &CredentialRecord, host_scheme: &RepoHostScheme) -> bool {
    let record_host = if record.host.is_empty() { default_host_for(record) } else { record.host.clone() };
    let host_matches = record_host.eq_ignore_ascii_case(&host_scheme.host);
    host_matches
}

fn default_host_for(record: &CredentialRecord) -> String {
    match record.provider {
        agent_hub_core::Provider::Github => "github.com".to_string(),
        agent_hub_core::Provider::Gitlab => "gitlab.com".to_string(),
    }
}

/// Resolve which credentials back a git operation against `repo_url`, given
/// the project's binding mode and the broker's full catalog. Probes `auto`
/// candidates live; `set`/`single`/`all` are returned without probing.
pub async fn resolve_for_repository(
    runner: &dyn CommandRunner,
    secrets: &dyn SecretResolver,
    secrets_dir: &Path,
    repo_url: &str,
    binding: &BindingMode,
    catalog: &HashMap<String, CredentialRecord>,
) -> HubResult<Vec<CredentialId>> {
    let host_scheme = parse_repo_host_scheme(repo_url)?;
    let host_filtered: HashMap<String, CredentialRecord> = catalog
        .iter()
        .filter(|(_, record)| matches_host_and_scheme(record, &host_scheme))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if !matches!(binding, BindingMode::Auto) {
        return Ok(resolve_candidates(binding, &host_filtered).into_iter().map(|c| c.id.clone()).collect());
    }

    let candidates = resolve_candidates(&BindingMode::Auto, &host_filtered);
    if candidates.is_empty() {
        return Err(HubError::credential_resolution(format!("no catalog entry matches host {}", host_scheme.host)));
    }

    let mut verified = Vec::new();
    for candidate in candidates {
        let Ok(secret) = secrets.resolve_secret(&candidate.id).await else {
            continue;
        };
        let context_key = format!("probe:{repo_url}");
        let file = materialize_credential_file(secrets_dir, &credential_file_name(&context_key, &candidate.id), &secret)?;
        let env = git_env_for_credential(&file);
        if probe_credential(runner, repo_url, &env).await.is_ok() {
            verified.push(candidate.id.clone());
        }
    }

    if verified.is_empty() {
        return Err(HubError::credential_resolution(format!("no candidate credential verified for {repo_url}")));
    }

    Ok(verified)
}

/// Content-addressed file name for a materialized credential:
/// `sha256(context_key|credential_id)[:24]`.
fn credential_file_name(context_key: &str, credential_id: &CredentialId) -> CredentialId {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(context_key.as_bytes());
    hasher.update(b"|");
    hasher.update(credential_id.as_str().as_bytes());
    let digest = hasher.finalize();
    CredentialId::from(hex::encode(digest)[..24].to_string())
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
