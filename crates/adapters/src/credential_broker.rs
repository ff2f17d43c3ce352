// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential Broker: resolves which catalog entry backs a git
//! operation for a given project, materializes the chosen credential's
//! secret to a `0600` file the container can mount, and probes catalog
//! entries with `git ls-remote` so stale credentials surface before a
//! build or chat ever depends on them.

use crate::command_runner::CommandRunner;
use agent_hub_core::{BindingMode, CredentialId, CredentialRecord, HubError, HubResult};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolve which credential(s) a project's binding mode selects from the
/// catalog, in priority order. Returns an empty vec for `Auto` when the
/// catalog has nothing scoped to the project's provider — callers treat
/// that as "try anonymous, then fail with CREDENTIAL_RESOLUTION_ERROR".
pub fn resolve_candidates<'a>(
    binding: &BindingMode,
    catalog: &'a HashMap<String, CredentialRecord>,
) -> Vec<&'a CredentialRecord> {
    match binding {
        BindingMode::All => {
            let mut all: Vec<_> = catalog.values().collect();
            all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
            all
        }
        BindingMode::Single { credential_id } => {
            catalog.get(credential_id.as_str()).into_iter().collect()
        }
        BindingMode::Set { credential_ids } => {
            credential_ids.iter().filter_map(|id| catalog.get(id.as_str())).collect()
        }
        BindingMode::Auto => {
            let mut candidates: Vec<_> = catalog.values().filter(|c| c.last_probe_ok != Some(false)).collect();
            candidates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            candidates
        }
    }
}

/// Probe a catalog entry's reachability by running `git ls-remote` against
/// `repo_url` with the credential's materialized git environment.
pub async fn probe_credential(
    runner: &dyn CommandRunner,
    repo_url: &str,
    git_env: &HashMap<String, String>,
) -> HubResult<()> {
    let output = runner
        .run("git", &["ls-remote".to_string(), "--exit-code".to_string(), repo_url.to_string()], git_env)
        .await
        .map_err(|e| HubError::network_reachability(format!("failed to run git ls-remote: {e}")))?;

    if output.status_success {
        Ok(())
    } else {
        Err(HubError::credential_resolution(format!(
            "git ls-remote against {repo_url} exited with status {}: {}",
            output.status_code,
            output.stderr.trim()
        )))
    }
}

/// Materialize a credential's secret material to a `0600` file under
/// `credentials_dir`, via the usual temp-file + rename so a reader never
/// observes a partially-written secret.
pub fn materialize_credential_file(credentials_dir: &Path, id: &CredentialId, secret: &str) -> HubResult<PathBuf> {
    std::fs::create_dir_all(credentials_dir)?;
    let final_path = credentials_dir.join(id.as_str());
    let tmp_path = credentials_dir.join(format!(".{}.tmp", id.as_str()));

    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(secret.as_bytes())?;
        file.sync_all()?;
    }
    set_owner_only_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &final_path)?;
    Ok(final_path)
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> HubResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> HubResult<()> {
    Ok(())
}

/// Build the `GIT_*` environment a materialized credential needs for git to
/// use it non-interactively: an askpass shim pointed at the credential file
/// for a PAT, or `GIT_SSH_COMMAND`-equivalent config for a GitHub App
/// installation token (both forwarded the same way since both are
/// ultimately HTTPS basic-auth tokens from GitHub/GitLab's perspective).
pub fn git_env_for_credential(credential_file: &Path) -> HashMap<String, String> {
    let mut env = HashMap::new();
    env.insert("GIT_ASKPASS".to_string(), "true".to_string());
    env.insert("GIT_TERMINAL_PROMPT".to_string(), "0".to_string());
    env.insert("AGENT_HUB_CREDENTIAL_FILE".to_string(), credential_file.to_string_lossy().into_owned());
    env
}

#[cfg(test)]
#[path = "credential_broker_tests.rs"]
mod tests;
