// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth login session records.
//!
//! Tracks a single "connect an account" flow end-to-end: a login container
//! is started, a browser or device-code URL is surfaced to the caller, and
//! the Callback Relay forwards the provider's redirect back into the
//! container. Like [`crate::session::AgentToolsSession`], these are
//! in-memory only and do not survive a daemon restart.

use crate::enums::{OAuthLoginMethod, OAuthLoginStatus};
use crate::ids::OAuthLoginSessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthLoginSession {
    pub id: OAuthLoginSessionId,
    pub method: OAuthLoginMethod,
    pub status: OAuthLoginStatus,
    pub status_reason: String,
    pub container_name: Option<String>,
    pub authorize_url: Option<String>,
    pub device_code: Option<String>,
    pub device_verification_url: Option<String>,
    pub callback_host: Option<String>,
    pub callback_port: Option<u16>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl OAuthLoginSession {
    pub fn transition(&mut self, status: OAuthLoginStatus, reason: impl Into<String>, now: chrono::DateTime<chrono::Utc>) {
        self.status = status;
        self.status_reason = reason.into();
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct OAuthLoginSessionBuilder => OAuthLoginSession {
        into {
            id: OAuthLoginSessionId = OAuthLoginSessionId::new(),
            status_reason: String = "created",
        }
        set {
            method: OAuthLoginMethod = OAuthLoginMethod::BrowserCallback,
            status: OAuthLoginStatus = OAuthLoginStatus::Starting,
            container_name: Option<String> = None,
            authorize_url: Option<String> = None,
            device_code: Option<String> = None,
            device_verification_url: Option<String> = None,
            callback_host: Option<String> = None,
            callback_port: Option<u16> = None,
            error: Option<String> = None,
        }
        computed {
            created_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
            updated_at: chrono::DateTime<chrono::Utc> = chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
