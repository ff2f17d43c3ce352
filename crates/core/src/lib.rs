// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agent-hub-core: shared domain types for the Agent Hub daemon.

pub mod macros;

pub mod chat;
pub mod clock;
pub mod credential;
pub mod enums;
pub mod error;
pub mod fingerprint;
pub mod id;
pub mod ids;
pub mod oauth;
pub mod project;
pub mod session;
pub mod settings;
pub mod shared;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(any(test, feature = "test-support"))]
pub use chat::ChatBuilder;
pub use chat::{Artifact, ArtifactHistoryEntry, Chat, MAX_ARTIFACTS, MAX_ARTIFACT_HISTORY};
pub use clock::{Clock, FakeClock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use credential::CredentialRecordBuilder;
pub use credential::{new_pat_credential_id, CredentialRecord};
pub use enums::{
    AgentType, BaseImageMode, BindingMode, BuildStatus, ChatStatus, CredentialKind,
    OAuthLoginMethod, OAuthLoginStatus, Provider, ReadyAckStage, TitleStatus,
};
pub use error::{HubError, HubResult};
pub use fingerprint::{setup_snapshot_digest, setup_snapshot_tag};
pub use id::{short, IdBuf, ID_MAX_LEN};
pub use ids::{AgentToolsSessionId, ArtifactId, ChatId, CredentialId, OAuthLoginSessionId, ProjectId};
#[cfg(any(test, feature = "test-support"))]
pub use oauth::OAuthLoginSessionBuilder;
pub use oauth::OAuthLoginSession;
#[cfg(any(test, feature = "test-support"))]
pub use project::ProjectBuilder;
pub use project::{FingerprintInputs, Project, ProjectPatch};
#[cfg(any(test, feature = "test-support"))]
pub use session::AgentToolsSessionBuilder;
pub use session::AgentToolsSession;
pub use settings::{Settings, SettingsPatch};
pub use shared::{normalize_csv, parse_gid_csv, parse_non_negative_int, split_csv, split_host_port};
