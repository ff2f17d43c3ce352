// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed operational errors surfaced to HTTP callers.
//!
//! Every variant carries a stable `error_code` string and a
//! `failure_class`/`user_message` pair that do not depend on the `detail`
//! payload, so a client can branch on `error_code` alone while `detail`
//! stays free-form for logging.

use thiserror::Error;

/// The five named failure taxonomies, plus the generic HTTP-shaped
/// catch-alls used by the daemon surface.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("identity error: {0}")]
    Identity(String),

    #[error("mount visibility error: {0}")]
    MountVisibility(String),

    #[error("network reachability error: {0}")]
    NetworkReachability(String),

    #[error("credential resolution error: {0}")]
    CredentialResolution(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            HubError::Config(_) => "CONFIG_ERROR",
            HubError::Identity(_) => "IDENTITY_ERROR",
            HubError::MountVisibility(_) => "MOUNT_VISIBILITY_ERROR",
            HubError::NetworkReachability(_) => "NETWORK_REACHABILITY_ERROR",
            HubError::CredentialResolution(_) => "CREDENTIAL_RESOLUTION_ERROR",
            HubError::BadRequest(_) => "BAD_REQUEST",
            HubError::NotFound(_) => "NOT_FOUND",
            HubError::Conflict(_) => "CONFLICT",
            HubError::Unprocessable(_) => "UNPROCESSABLE_ENTITY",
            HubError::RateLimited(_) => "RATE_LIMITED",
            HubError::Upstream(_) => "UPSTREAM_ERROR",
            HubError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Fixed, detail-independent class used for metrics/log grouping.
    pub fn failure_class(&self) -> &'static str {
        match self {
            HubError::Config(_) => "configuration",
            HubError::Identity(_) => "identity",
            HubError::MountVisibility(_) => "mount_visibility",
            HubError::NetworkReachability(_) => "network",
            HubError::CredentialResolution(_) => "credentials",
            HubError::BadRequest(_) => "bad_request",
            HubError::NotFound(_) => "not_found",
            HubError::Conflict(_) => "conflict",
            HubError::Unprocessable(_) => "unprocessable",
            HubError::RateLimited(_) => "rate_limited",
            HubError::Upstream(_) => "upstream",
            HubError::Internal(_) => "internal",
        }
    }

    /// Fixed user-facing message, independent of `detail`.
    pub fn user_message(&self) -> &'static str {
        match self {
            HubError::Config(_) => "Configuration is invalid.",
            HubError::Identity(_) => "Runtime identity resolution failed.",
            HubError::MountVisibility(_) => "Mount path is not visible to the runtime.",
            HubError::NetworkReachability(_) => "Required network endpoint is not reachable.",
            HubError::CredentialResolution(_) => "Credential resolution failed.",
            HubError::BadRequest(_) => "The request was invalid.",
            HubError::NotFound(_) => "The requested resource was not found.",
            HubError::Conflict(_) => "The request conflicts with the current state.",
            HubError::Unprocessable(_) => "The request could not be processed.",
            HubError::RateLimited(_) => "Too many requests.",
            HubError::Upstream(_) => "An upstream service failed.",
            HubError::Internal(_) => "An internal error occurred.",
        }
    }

    /// HTTP status code the daemon surface maps this to.
    pub fn status_code(&self) -> u16 {
        match self {
            HubError::Config(_) => 400,
            HubError::Identity(_) => 500,
            HubError::MountVisibility(_) => 409,
            HubError::NetworkReachability(_) => 502,
            HubError::CredentialResolution(_) => 401,
            HubError::BadRequest(_) => 400,
            HubError::NotFound(_) => 404,
            HubError::Conflict(_) => 409,
            HubError::Unprocessable(_) => 422,
            HubError::RateLimited(_) => 429,
            HubError::Upstream(_) => 502,
            HubError::Internal(_) => 500,
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        HubError::Config(detail.into())
    }

    pub fn identity(detail: impl Into<String>) -> Self {
        HubError::Identity(detail.into())
    }

    pub fn credential_resolution(detail: impl Into<String>) -> Self {
        HubError::CredentialResolution(detail.into())
    }

    pub fn network_reachability(detail: impl Into<String>) -> Self {
        HubError::NetworkReachability(detail.into())
    }

    pub fn mount_visibility(detail: impl Into<String>) -> Self {
        HubError::MountVisibility(detail.into())
    }
}

impl From<std::io::Error> for HubError {
    fn from(e: std::io::Error) -> Self {
        HubError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        HubError::Config(format!("invalid JSON: {e}"))
    }
}

pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
