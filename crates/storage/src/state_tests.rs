// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::{ChatStatus, Project};

#[test]
fn default_state_is_at_current_version() {
    let state = State::default();
    assert_eq!(state.version, CURRENT_STATE_VERSION);
    assert!(state.projects.is_empty());
}

#[test]
fn normalize_clears_pid_on_terminal_chat() {
    let mut state = State::default();
    let chat = agent_hub_core::Chat::builder().status(ChatStatus::Stopped).pid(Some(123)).build();
    state.chats.insert(chat.id.to_string(), chat);

    let changed = state.normalize();
    assert!(changed);
    assert!(state.chats.values().all(|c| c.pid.is_none()));

    assert!(!state.normalize());
}

#[test]
fn normalize_bumps_stale_version() {
    let mut state = State::default();
    state.version = 0;
    assert!(state.normalize());
    assert_eq!(state.version, CURRENT_STATE_VERSION);
}

#[test]
fn project_by_name_finds_inserted_project() {
    let mut state = State::default();
    let project = Project::builder().name("demo").build();
    state.projects.insert(project.id.to_string(), project);
    assert!(state.project_by_name("demo").is_some());
    assert!(state.project_by_name("missing").is_none());
}

#[test]
fn chats_for_project_filters_by_project_id() {
    let mut state = State::default();
    let project = Project::builder().build();
    let chat_a = agent_hub_core::Chat::builder().project_id(project.id).build();
    let chat_b = agent_hub_core::Chat::builder().build();
    state.chats.insert(chat_a.id.to_string(), chat_a);
    state.chats.insert(chat_b.id.to_string(), chat_b);

    let matches: Vec<_> = state.chats_for_project(&project.id).collect();
    assert_eq!(matches.len(), 1);
}
