// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn agent_type_normalize_rejects_unknown() {
    assert!(AgentType::normalize("codex").is_ok());
    let err = AgentType::normalize("chatgippity").unwrap_err();
    assert_eq!(err.code(), "CONFIG_ERROR");
}

#[test]
fn build_status_normalize_defaults_unknown_to_pending() {
    assert_eq!(BuildStatus::normalize("ready"), BuildStatus::Ready);
    assert_eq!(BuildStatus::normalize("bogus"), BuildStatus::Pending);
}

#[test]
fn chat_status_normalize_rejects_unknown() {
    assert!(ChatStatus::normalize("running").is_ok());
    assert!(ChatStatus::normalize("zombie").is_err());
}

#[test]
fn chat_status_terminal_states() {
    assert!(ChatStatus::Stopped.is_terminal());
    assert!(ChatStatus::Failed.is_terminal());
    assert!(!ChatStatus::Running.is_terminal());
    assert!(!ChatStatus::Starting.is_terminal());
}

#[test]
fn binding_mode_normalize_set_mode() {
    let raw = serde_json::json!({"mode": "set", "credential_ids": ["a", "b"]});
    let mode = BindingMode::normalize(&raw).unwrap();
    assert_eq!(
        mode,
        BindingMode::Set { credential_ids: vec!["a".into(), "b".into()] }
    );
}

#[test]
fn binding_mode_normalize_auto_mode() {
    let raw = serde_json::json!({"mode": "auto"});
    assert_eq!(BindingMode::normalize(&raw).unwrap(), BindingMode::Auto);
}

#[test]
fn title_status_normalize_defaults_to_idle() {
    assert_eq!(TitleStatus::normalize("bogus"), TitleStatus::Idle);
    assert_eq!(TitleStatus::normalize("ready"), TitleStatus::Ready);
}

#[test]
fn ready_ack_stage_round_trips() {
    assert_eq!(
        ReadyAckStage::normalize("container_bootstrapped").unwrap(),
        ReadyAckStage::ContainerBootstrapped
    );
    assert!(ReadyAckStage::normalize("nope").is_err());
}

#[test]
fn oauth_login_status_terminal_states() {
    assert!(OAuthLoginStatus::Connected.is_terminal());
    assert!(OAuthLoginStatus::Failed.is_terminal());
    assert!(OAuthLoginStatus::Cancelled.is_terminal());
    assert!(!OAuthLoginStatus::Running.is_terminal());
}
