// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn artifact_ids_consistent_accepts_subset() {
    let artifact = Artifact {
        id: ArtifactId::new(),
        name: "out.txt".into(),
        relative_path: "out.txt".into(),
        storage_relative_path: "00/out.txt".into(),
        size_bytes: 12,
        created_at: chrono::Utc::now(),
    };
    let chat = Chat::builder()
        .artifact_current_ids(vec![artifact.id.clone()])
        .artifacts(vec![artifact])
        .build();
    assert!(chat.artifact_ids_consistent());
}

#[test]
fn artifact_ids_consistent_rejects_dangling_reference() {
    let chat = Chat::builder().artifact_current_ids(vec![ArtifactId::new()]).build();
    assert!(!chat.artifact_ids_consistent());
}

#[test]
fn transition_updates_reason_and_timestamps() {
    let mut chat = Chat::builder().status(ChatStatus::Starting).build();
    let now = chrono::Utc::now();
    chat.transition(ChatStatus::Running, "agent process started", now);
    assert_eq!(chat.status, ChatStatus::Running);
    assert_eq!(chat.status_reason, "agent process started");
    assert_eq!(chat.last_status_transition_at, now);
    assert_eq!(chat.updated_at, now);
}

#[test]
fn running_without_pid_is_not_a_live_pid_claim() {
    let chat = Chat::builder().status(ChatStatus::Running).pid(None).build();
    assert!(!chat.is_running_with_live_pid_claim());
}

#[test]
fn running_with_pid_is_a_live_pid_claim() {
    let chat = Chat::builder().status(ChatStatus::Running).pid(Some(4242)).build();
    assert!(chat.is_running_with_live_pid_claim());
}
