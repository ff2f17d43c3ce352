// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sum types for the dynamic fields the original implementation modeled as
//! free-form strings.
//!
//! Each enum exposes `normalize(raw) -> Result<Self, HubError>` so the state
//! store's loader can coerce persisted JSON into the canonical set,
//! rewriting the file when normalization changes anything.

use crate::error::HubError;
use serde::{Deserialize, Serialize};

/// Which agent CLI a chat launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Codex,
    Claude,
    Gemini,
}

crate::simple_display! {
    AgentType {
        Codex => "codex",
        Claude => "claude",
        Gemini => "gemini",
    }
}

impl AgentType {
    /// Unknown agent types are not silently coerced — the agent command is
    /// load-bearing for the launch compiler, so an unrecognized value is a
    /// configuration error rather than a default.
    pub fn normalize(raw: &str) -> Result<Self, HubError> {
        match raw {
            "codex" => Ok(Self::Codex),
            "claude" => Ok(Self::Claude),
            "gemini" => Ok(Self::Gemini),
            other => Err(HubError::config(format!("unknown agent_type: {other:?}"))),
        }
    }
}

/// Base image source for a project's setup snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseImageMode {
    Tag,
    RepoPath,
}

crate::simple_display! {
    BaseImageMode {
        Tag => "tag",
        RepoPath => "repo_path",
    }
}

impl BaseImageMode {
    pub fn normalize(raw: &str) -> Result<Self, HubError> {
        match raw {
            "tag" => Ok(Self::Tag),
            "repo_path" => Ok(Self::RepoPath),
            other => Err(HubError::config(format!("unknown base_image_mode: {other:?}"))),
        }
    }
}

/// Project build lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Building,
    Ready,
    Failed,
    Cancelled,
}

crate::simple_display! {
    BuildStatus {
        Pending => "pending",
        Building => "building",
        Ready => "ready",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl BuildStatus {
    /// Unknown values fall back to `pending`: worst case the scheduler
    /// re-runs a build, which is always safe, so this is a default rather
    /// than a hard `CONFIG_ERROR`.
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "building" => Self::Building,
            "ready" => Self::Ready,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

/// Chat runtime status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Starting,
    Running,
    Stopped,
    Failed,
}

crate::simple_display! {
    ChatStatus {
        Starting => "starting",
        Running => "running",
        Stopped => "stopped",
        Failed => "failed",
    }
}

impl ChatStatus {
    /// Unlike `BuildStatus`, an unrecognized chat status is not safely
    /// defaulted: `running` carries a live-pid invariant that
    /// must never be assumed by accident, so unknown values are rejected.
    pub fn normalize(raw: &str) -> Result<Self, HubError> {
        match raw {
            "starting" => Ok(Self::Starting),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "failed" => Ok(Self::Failed),
            other => Err(HubError::config(format!("unknown chat status: {other:?}"))),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

/// Kind of credential held by the broker's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    GithubAppInstallation,
    PersonalAccessToken,
}

crate::simple_display! {
    CredentialKind {
        GithubAppInstallation => "github_app_installation",
        PersonalAccessToken => "personal_access_token",
    }
}

/// Git hosting provider a credential is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Github,
    Gitlab,
}

crate::simple_display! {
    Provider {
        Github => "github",
        Gitlab => "gitlab",
    }
}

impl Provider {
    pub fn normalize(raw: &str) -> Result<Self, HubError> {
        match raw {
            "github" => Ok(Self::Github),
            "gitlab" => Ok(Self::Gitlab),
            other => Err(HubError::config(format!("unknown provider: {other:?}"))),
        }
    }
}

/// Project credential-binding policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BindingMode {
    Auto,
    Set { credential_ids: Vec<String> },
    Single { credential_id: String },
    All,
}

impl BindingMode {
    pub fn normalize(raw: &serde_json::Value) -> Result<Self, HubError> {
        serde_json::from_value(raw.clone())
            .map_err(|e| HubError::config(format!("invalid credential_binding: {e}")))
    }
}

/// Title-generation status on a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    Idle,
    Pending,
    Ready,
    Error,
}

crate::simple_display! {
    TitleStatus {
        Idle => "idle",
        Pending => "pending",
        Ready => "ready",
        Error => "error",
    }
}

impl TitleStatus {
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "ready" => Self::Ready,
            "error" => Self::Error,
            _ => Self::Idle,
        }
    }
}

/// Which bootstrap milestone a ready-ack GUID was accepted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyAckStage {
    ContainerBootstrapped,
    AgentProcessStarted,
}

crate::simple_display! {
    ReadyAckStage {
        ContainerBootstrapped => "container_bootstrapped",
        AgentProcessStarted => "agent_process_started",
    }
}

impl ReadyAckStage {
    pub fn normalize(raw: &str) -> Result<Self, HubError> {
        match raw {
            "container_bootstrapped" => Ok(Self::ContainerBootstrapped),
            "agent_process_started" => Ok(Self::AgentProcessStarted),
            other => Err(HubError::config(format!("unknown ready_ack_stage: {other:?}"))),
        }
    }
}

/// OAuth login flow a login session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthLoginMethod {
    BrowserCallback,
    DeviceAuth,
}

/// OAuth login session status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthLoginStatus {
    Starting,
    Running,
    WaitingForBrowser,
    WaitingForDeviceCode,
    CallbackReceived,
    Connected,
    Failed,
    Cancelled,
}

impl OAuthLoginStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Connected | Self::Failed | Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "enums_tests.rs"]
mod tests;
