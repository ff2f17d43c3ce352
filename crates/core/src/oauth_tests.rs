// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn transition_to_terminal_state_is_reported_by_is_terminal() {
    let mut session = OAuthLoginSession::builder().status(OAuthLoginStatus::Running).build();
    assert!(!session.is_terminal());

    session.transition(OAuthLoginStatus::Connected, "account linked", chrono::Utc::now());
    assert!(session.is_terminal());
    assert_eq!(session.status_reason, "account linked");
}

#[test]
fn cancelled_and_failed_are_both_terminal() {
    let mut a = OAuthLoginSession::builder().build();
    a.transition(OAuthLoginStatus::Cancelled, "user cancelled", chrono::Utc::now());
    assert!(a.is_terminal());

    let mut b = OAuthLoginSession::builder().build();
    b.transition(OAuthLoginStatus::Failed, "provider rejected request", chrono::Utc::now());
    assert!(b.is_terminal());
}
