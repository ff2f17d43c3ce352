// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete implementations of the injected seams [`agent_hub_engine`]
//! leaves abstract: where a credential's plaintext secret actually lives,
//! how an image/container is actually inspected, and how an OpenAI
//! credential is actually resolved. Everything here shells out through
//! [`CommandRunner`] or touches the filesystem directly; the engine crate
//! itself never does either.

use agent_hub_adapters::CommandRunner;
use agent_hub_core::{CredentialId, HubError, HubResult};
use agent_hub_engine::{ContainerInfo, ContainerInspector, ImageInspector, OpenAiCredentialSource, OpenAiCredentials, SecretResolver};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a connected credential's plaintext secret is stored: a `0600` file
/// per id under `<data_dir>/secrets/credentials/<id>.secret`, written by the
/// settings routes when a PAT is connected or a GitHub App private key is
/// configured.
pub struct FileSecretResolver {
    secrets_dir: PathBuf,
}

impl FileSecretResolver {
    pub fn new(data_dir: &Path) -> Self {
        Self { secrets_dir: data_dir.join("secrets").join("credentials") }
    }

    pub fn secret_path(&self, credential_id: &CredentialId) -> PathBuf {
        self.secrets_dir.join(format!("{}.secret", sanitize(credential_id.as_str())))
    }

    /// Write a credential's plaintext secret with `0600` permissions,
    /// mirroring how [`agent_hub_adapters::materialize_credential_file`]
    /// lays down the clone-time credential file.
    pub fn store_secret(&self, credential_id: &CredentialId, secret: &str) -> HubResult<()> {
        std::fs::create_dir_all(&self.secrets_dir)?;
        let path = self.secret_path(credential_id);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, secret)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn remove_secret(&self, credential_id: &CredentialId) -> HubResult<()> {
        let path = self.secret_path(credential_id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn sanitize(id: &str) -> String {
    id.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' }).collect()
}

#[async_trait]
impl SecretResolver for FileSecretResolver {
    async fn resolve_secret(&self, credential_id: &CredentialId) -> HubResult<String> {
        let path = self.secret_path(credential_id);
        std::fs::read_to_string(&path).map_err(|_| HubError::credential_resolution(format!("no secret material on file for credential {credential_id}")))
    }
}

/// Inspects and removes images/containers via the `docker` CLI, the same
/// way [`agent_hub_engine::build_pipeline::BuildWorker`] drives `docker
/// build` through [`CommandRunner`].
pub struct DockerInspector {
    runner: Arc<dyn CommandRunner>,
}

impl DockerInspector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ImageInspector for DockerInspector {
    async fn image_exists(&self, tag: &str) -> HubResult<bool> {
        let env = std::collections::HashMap::new();
        let output = self
            .runner
            .run("docker", &["image".to_string(), "inspect".to_string(), tag.to_string()], &env)
            .await
            .map_err(|e| HubError::Internal(format!("failed to run docker image inspect: {e}")))?;
        Ok(output.status_success)
    }
}

#[async_trait]
impl ContainerInspector for DockerInspector {
    async fn list_containers(&self, name_prefix: &str) -> HubResult<Vec<ContainerInfo>> {
        let env = std::collections::HashMap::new();
        let output = self
            .runner
            .run(
                "docker",
                &[
                    "ps".to_string(),
                    "--all".to_string(),
                    "--filter".to_string(),
                    format!("name=^{name_prefix}"),
                    "--format".to_string(),
                    "{{.Names}}\t{{.State}}".to_string(),
                ],
                &env,
            )
            .await
            .map_err(|e| HubError::Internal(format!("failed to run docker ps: {e}")))?;

        if !output.status_success {
            return Err(HubError::Internal(format!("docker ps exited with status {}: {}", output.status_code, output.stderr.trim())));
        }

        Ok(output
            .stdout
            .lines()
            .filter_map(|line| {
                let (name, state) = line.split_once('\t')?;
                Some(ContainerInfo { name: name.to_string(), running: state == "running" })
            })
            .collect())
    }

    async fn remove_container(&self, name: &str) -> HubResult<()> {
        let env = std::collections::HashMap::new();
        let output = self
            .runner
            .run("docker", &["rm".to_string(), "--force".to_string(), name.to_string()], &env)
            .await
            .map_err(|e| HubError::Internal(format!("failed to run docker rm: {e}")))?;
        if !output.status_success {
            return Err(HubError::Internal(format!("docker rm {name} exited with status {}: {}", output.status_code, output.stderr.trim())));
        }
        Ok(())
    }
}

/// Resolves the hub's own OpenAI credential: either a plaintext API key
/// file, or a codex account-session home directory, under
/// `<data_dir>/secrets/openai/`. Kept as a small filesystem seam rather
/// than going through [`FileSecretResolver`], since this secret is never
/// keyed by a [`CredentialId`] — there is at most one OpenAI credential for
/// the whole hub.
pub struct FileOpenAiCredentialSource {
    api_key_path: PathBuf,
    codex_home: PathBuf,
}

impl FileOpenAiCredentialSource {
    pub fn new(data_dir: &Path) -> Self {
        let base = data_dir.join("secrets").join("openai");
        Self { api_key_path: base.join("api_key"), codex_home: base.join("codex_home") }
    }

    pub fn store_api_key(&self, key: &str) -> HubResult<()> {
        if let Some(parent) = self.api_key_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.api_key_path, key)?;
        Ok(())
    }

    pub fn disconnect(&self) -> HubResult<()> {
        if self.api_key_path.exists() {
            std::fs::remove_file(&self.api_key_path)?;
        }
        if self.codex_home.exists() {
            std::fs::remove_dir_all(&self.codex_home)?;
        }
        Ok(())
    }

    pub fn codex_home(&self) -> &Path {
        &self.codex_home
    }
}

impl OpenAiCredentialSource for FileOpenAiCredentialSource {
    fn resolve(&self) -> Option<OpenAiCredentials> {
        if let Ok(key) = std::fs::read_to_string(&self.api_key_path) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Some(OpenAiCredentials::ApiKey(key));
            }
        }
        if self.codex_home.join("auth.json").exists() {
            return Some(OpenAiCredentials::Account { codex_home: self.codex_home.clone() });
        }
        None
    }
}

/// The GitHub App record persisted once the manifest conversion flow
/// completes, mirroring the `{id, slug, pem, html_url}` shape the manifest
/// conversion response normalizes to.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GithubAppSettings {
    pub id: String,
    pub slug: String,
    pub pem: String,
    pub html_url: String,
}

pub fn github_app_settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("secrets").join("github_app_settings.json")
}

pub fn load_github_app_settings(data_dir: &Path) -> Option<GithubAppSettings> {
    let raw = std::fs::read_to_string(github_app_settings_path(data_dir)).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Persist a freshly converted GitHub App manifest as a private file, the
/// same temp-file-then-rename pattern every other secret on disk uses.
pub fn store_github_app_settings(data_dir: &Path, settings: &GithubAppSettings) -> HubResult<()> {
    let path = github_app_settings_path(data_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(settings)?)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
    }
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

/// One connected GitHub App installation: just enough to mint installation
/// tokens and show the UI what is connected.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GithubAppInstallationRecord {
    pub installation_id: u64,
    pub account_login: String,
}

pub fn github_app_installation_path(data_dir: &Path) -> PathBuf {
    data_dir.join("secrets").join("github_app_installation.json")
}

pub fn load_github_app_installation(data_dir: &Path) -> Option<GithubAppInstallationRecord> {
    let raw = std::fs::read_to_string(github_app_installation_path(data_dir)).ok()?;
    serde_json::from_str(&raw).ok()
}

pub fn store_github_app_installation(data_dir: &Path, record: &GithubAppInstallationRecord) -> HubResult<()> {
    let path = github_app_installation_path(data_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_vec_pretty(record)?)?;
    Ok(())
}

pub fn remove_github_app_installation(data_dir: &Path) -> HubResult<()> {
    let path = github_app_installation_path(data_dir);
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// A connected PAT: `{credential_id, provider, host, label}` plus the
/// secret itself in [`FileSecretResolver`]'s store, keyed the same way.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PatTokenRecord {
    pub credential_id: String,
    pub provider: String,
    pub host: String,
    pub label: String,
}

fn pat_tokens_path(data_dir: &Path, provider: &str) -> PathBuf {
    data_dir.join("secrets").join(format!("{provider}_tokens.json"))
}

pub fn load_pat_tokens(data_dir: &Path, provider: &str) -> Vec<PatTokenRecord> {
    std::fs::read_to_string(pat_tokens_path(data_dir, provider))
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub fn store_pat_tokens(data_dir: &Path, provider: &str, tokens: &[PatTokenRecord]) -> HubResult<()> {
    let path = pat_tokens_path(data_dir, provider);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_vec_pretty(tokens)?)?;
    Ok(())
}
