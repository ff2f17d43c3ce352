// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level configuration: identity overrides, the data directory,
//! GitHub App settings, and timeouts. Distinct from the product-level
//! `Settings` in `agent-hub-core`, which lives in the state store and is
//! reachable over `/api/settings`.

use agent_hub_core::HubError;
use serde::Deserialize;
use std::path::PathBuf;

fn default_bind_addr() -> String {
    "127.0.0.1:4180".to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("agent-hub")
}

fn default_auto_config_timeout_seconds() -> u64 {
    600
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubAppConfig {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub private_key: Option<String>,
    pub private_key_file: Option<PathBuf>,
    pub web_base_url: Option<String>,
    pub api_base_url: Option<String>,
}

impl GithubAppConfig {
    fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.slug.is_none()
            && self.private_key.is_none()
            && self.private_key_file.is_none()
            && self.web_base_url.is_none()
            && self.api_base_url.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    pub shared_root: Option<PathBuf>,
    pub tmp_host_path: Option<PathBuf>,
    #[serde(default)]
    pub github_app: GithubAppConfig,
    pub agent_tools_url: Option<String>,
    pub chat_title_model: Option<String>,
    #[serde(default = "default_auto_config_timeout_seconds")]
    pub auto_config_timeout_seconds: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: default_data_dir(),
            shared_root: None,
            tmp_host_path: None,
            github_app: GithubAppConfig::default(),
            agent_tools_url: None,
            chat_title_model: None,
            auto_config_timeout_seconds: default_auto_config_timeout_seconds(),
        }
    }
}

impl HubConfig {
    pub fn github_app(&self) -> Option<&GithubAppConfig> {
        if self.github_app.is_empty() {
            None
        } else {
            Some(&self.github_app)
        }
    }
}

/// Apply a single flat `AGENT_HUB_*` environment variable onto a config
/// value already loaded from `agent-hub.toml`. The hub's own env var names
/// (`AGENT_HUB_GITHUB_APP_ID`, `AGENT_HUB_SHARED_ROOT`, ...) are single
/// underscore-separated and don't nest cleanly through `config`'s generic
/// `Environment` source, so they're read directly instead.
fn apply_env_overrides(cfg: &mut HubConfig) {
    if let Ok(v) = std::env::var("AGENT_HUB_BIND_ADDR") {
        cfg.bind_addr = v;
    }
    if let Ok(v) = std::env::var("AGENT_HUB_DATA_DIR") {
        cfg.data_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("AGENT_HUB_SHARED_ROOT") {
        cfg.shared_root = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("AGENT_HUB_TMP_HOST_PATH") {
        cfg.tmp_host_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("AGENT_HUB_AGENT_TOOLS_URL") {
        cfg.agent_tools_url = Some(v);
    }
    if let Ok(v) = std::env::var("AGENT_HUB_CHAT_TITLE_MODEL") {
        cfg.chat_title_model = Some(v);
    }
    if let Ok(v) = std::env::var("AGENT_HUB_AUTO_CONFIG_TIMEOUT_SECONDS") {
        if let Ok(seconds) = v.parse() {
            cfg.auto_config_timeout_seconds = seconds;
        }
    }
    if let Ok(v) = std::env::var("AGENT_HUB_GITHUB_APP_ID") {
        cfg.github_app.id = Some(v);
    }
    if let Ok(v) = std::env::var("AGENT_HUB_GITHUB_APP_SLUG") {
        cfg.github_app.slug = Some(v);
    }
    if let Ok(v) = std::env::var("AGENT_HUB_GITHUB_APP_PRIVATE_KEY") {
        cfg.github_app.private_key = Some(v);
    }
    if let Ok(v) = std::env::var("AGENT_HUB_GITHUB_APP_PRIVATE_KEY_FILE") {
        cfg.github_app.private_key_file = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("AGENT_HUB_GITHUB_APP_WEB_BASE_URL") {
        cfg.github_app.web_base_url = Some(v);
    }
    if let Ok(v) = std::env::var("AGENT_HUB_GITHUB_APP_API_BASE_URL") {
        cfg.github_app.api_base_url = Some(v);
    }
}

/// Load `agent-hub.toml` (if present, either in the working directory or
/// pointed at by `AGENT_HUB_CONFIG_FILE`) layered with the flat `AGENT_HUB_*`
/// environment variables named in the external interface.
pub fn load() -> Result<HubConfig, HubError> {
    let config_file = std::env::var("AGENT_HUB_CONFIG_FILE").unwrap_or_else(|_| "agent-hub.toml".to_string());
    let builder = config::Config::builder().add_source(config::File::with_name(&config_file).required(false));

    let raw = builder.build().map_err(|e| HubError::config(format!("failed to load configuration: {e}")))?;
    let mut cfg: HubConfig = raw.try_deserialize().map_err(|e| HubError::config(format!("invalid configuration: {e}")))?;

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}
