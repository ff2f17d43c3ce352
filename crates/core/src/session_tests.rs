// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn session_not_expired_before_expiry() {
    let session = AgentToolsSession::builder().build();
    assert!(!session.is_expired(session.created_at));
}

#[test]
fn session_expired_at_or_after_expiry() {
    let session = AgentToolsSession::builder().build();
    assert!(session.is_expired(session.expires_at));
    assert!(session.is_expired(session.expires_at + chrono::Duration::seconds(1)));
}
