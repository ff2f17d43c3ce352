// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact Store: ingests files published from a chat's
//! workspace, caps the live set and the archived prompt history, and
//! atomically copies the underlying bytes into per-chat storage.

use agent_hub_core::{Artifact, ArtifactHistoryEntry, ArtifactId, Chat, MAX_ARTIFACTS, MAX_ARTIFACT_HISTORY};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where a chat's artifacts live under the data directory.
pub fn chat_artifact_dir(data_dir: &Path, chat_id: &str) -> PathBuf {
    data_dir.join("artifacts").join("chats").join(chat_id)
}

/// Copy `source` into the artifact directory (temp+rename), record it on
/// the chat, update `artifact_current_ids`, and enforce the count cap.
pub fn ingest(chat: &mut Chat, data_dir: &Path, source: &Path, name: &str, now: chrono::DateTime<chrono::Utc>) -> std::io::Result<Artifact> {
    let artifact_id = ArtifactId::new();
    let dir = chat_artifact_dir(data_dir, chat.id.as_str()).join(artifact_id.as_str());
    std::fs::create_dir_all(&dir)?;

    let final_path = dir.join(name);
    let tmp_path = dir.join(format!(".{name}.tmp"));
    std::fs::copy(source, &tmp_path)?;
    {
        let file = std::fs::File::open(&tmp_path)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, &final_path)?;

    let size_bytes = std::fs::metadata(&final_path)?.len();
    let storage_relative_path = format!("chats/{}/{}/{}", chat.id.as_str(), artifact_id.as_str(), name);

    let artifact = Artifact {
        id: artifact_id,
        name: name.to_string(),
        relative_path: name.to_string(),
        storage_relative_path,
        size_bytes,
        created_at: now,
    };

    chat.artifacts.push(artifact.clone());
    chat.artifact_current_ids.push(artifact.id.clone());
    enforce_artifact_cap(chat);
    chat.updated_at = now;

    Ok(artifact)
}

fn enforce_artifact_cap(chat: &mut Chat) {
    while chat.artifacts.len() > MAX_ARTIFACTS {
        let oldest_id = chat.artifacts.remove(0).id;
        chat.artifact_current_ids.retain(|id| *id != oldest_id);
    }
}

/// Archive the chat's currently-current artifacts under the *previous*
/// prompt's text, then clear `artifact_current_ids` for the new prompt.
/// Called whenever a new prompt is submitted.
pub fn archive_on_new_prompt(chat: &mut Chat, previous_prompt: &str, now: chrono::DateTime<chrono::Utc>) {
    if chat.artifact_current_ids.is_empty() {
        return;
    }

    chat.artifact_prompt_history.push(ArtifactHistoryEntry {
        prompt: previous_prompt.to_string(),
        artifact_ids: std::mem::take(&mut chat.artifact_current_ids),
        archived_at: now,
    });

    while chat.artifact_prompt_history.len() > MAX_ARTIFACT_HISTORY {
        chat.artifact_prompt_history.remove(0);
    }
    chat.updated_at = now;
}

/// Stage a multipart/file-upload body inside the chat workspace before
/// ingesting it, mirroring the JSON-upload path's atomic ingest step.
pub fn stage_upload(workspace: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let staging_dir = workspace.join(".agent-hub-artifacts");
    std::fs::create_dir_all(&staging_dir)?;
    let staged_path = staging_dir.join(format!("{}-{name}", uuid::Uuid::new_v4()));
    let mut file = std::fs::File::create(&staged_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(staged_path)
}

#[cfg(test)]
#[path = "artifact_store_tests.rs"]
mod tests;
