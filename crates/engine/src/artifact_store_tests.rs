// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::Chat;

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

#[test]
fn ingest_copies_the_file_and_records_it_on_the_chat() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().join("data");
    let source = tmp.path().join("notes.txt");
    std::fs::write(&source, b"hello artifact").unwrap();

    let mut chat = Chat::builder().build();
    let artifact = ingest(&mut chat, &data_dir, &source, "notes.txt", now()).unwrap();

    assert_eq!(artifact.name, "notes.txt");
    assert_eq!(artifact.size_bytes, 14);
    assert_eq!(chat.artifacts.len(), 1);
    assert_eq!(chat.artifact_current_ids, vec![artifact.id]);

    let final_path = chat_artifact_dir(&data_dir, chat.id.as_str())
        .join(artifact.id.as_str())
        .join("notes.txt");
    assert_eq!(std::fs::read(final_path).unwrap(), b"hello artifact");
}

#[test]
fn enforce_artifact_cap_evicts_the_oldest_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().join("data");
    let mut chat = Chat::builder().build();

    for i in 0..(MAX_ARTIFACTS + 3) {
        let source = tmp.path().join(format!("f{i}.txt"));
        std::fs::write(&source, format!("content-{i}")).unwrap();
        ingest(&mut chat, &data_dir, &source, &format!("f{i}.txt"), now()).unwrap();
    }

    assert_eq!(chat.artifacts.len(), MAX_ARTIFACTS);
    assert_eq!(chat.artifact_current_ids.len(), MAX_ARTIFACTS);
    assert_eq!(chat.artifacts.first().unwrap().name, "f3.txt");
}

#[test]
fn archive_on_new_prompt_moves_current_ids_into_history() {
    let mut chat = Chat::builder().build();
    chat.artifacts.push(Artifact {
        id: ArtifactId::new(),
        name: "a.txt".into(),
        relative_path: "a.txt".into(),
        storage_relative_path: "chats/x/y/a.txt".into(),
        size_bytes: 1,
        created_at: now(),
    });
    chat.artifact_current_ids = vec![chat.artifacts[0].id];

    archive_on_new_prompt(&mut chat, "fix the thing", now());

    assert!(chat.artifact_current_ids.is_empty());
    assert_eq!(chat.artifact_prompt_history.len(), 1);
    assert_eq!(chat.artifact_prompt_history[0].prompt, "fix the thing");
    assert_eq!(chat.artifact_prompt_history[0].artifact_ids.len(), 1);
}

#[test]
fn archive_on_new_prompt_is_a_no_op_when_nothing_is_current() {
    let mut chat = Chat::builder().build();
    archive_on_new_prompt(&mut chat, "whatever", now());
    assert!(chat.artifact_prompt_history.is_empty());
}

#[test]
fn archive_on_new_prompt_caps_history_length() {
    let mut chat = Chat::builder().build();
    for i in 0..(MAX_ARTIFACT_HISTORY + 2) {
        chat.artifacts.push(Artifact {
            id: ArtifactId::new(),
            name: format!("a{i}.txt"),
            relative_path: format!("a{i}.txt"),
            storage_relative_path: format!("chats/x/y/a{i}.txt"),
            size_bytes: 1,
            created_at: now(),
        });
        chat.artifact_current_ids = vec![chat.artifacts.last().unwrap().id];
        archive_on_new_prompt(&mut chat, &format!("prompt {i}"), now());
    }

    assert_eq!(chat.artifact_prompt_history.len(), MAX_ARTIFACT_HISTORY);
    assert_eq!(chat.artifact_prompt_history[0].prompt, "prompt 2");
}

#[test]
fn stage_upload_writes_bytes_under_a_hidden_staging_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let staged = stage_upload(tmp.path(), "report.pdf", b"%PDF-1.4").unwrap();

    assert!(staged.starts_with(tmp.path().join(".agent-hub-artifacts")));
    assert!(staged.file_name().unwrap().to_str().unwrap().ends_with("-report.pdf"));
    assert_eq!(std::fs::read(&staged).unwrap(), b"%PDF-1.4");
}

#[test]
fn stage_upload_generates_distinct_names_for_repeated_uploads() {
    let tmp = tempfile::tempdir().unwrap();
    let first = stage_upload(tmp.path(), "same.txt", b"one").unwrap();
    let second = stage_upload(tmp.path(), "same.txt", b"two").unwrap();
    assert_ne!(first, second);
}
