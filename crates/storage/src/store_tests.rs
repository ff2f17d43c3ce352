// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::Project;

fn temp_state_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    (dir, path)
}

#[test]
fn open_on_missing_path_creates_default_state_file() {
    let (_dir, path) = temp_state_path();
    let store = StateStore::open(&path).unwrap();
    assert!(path.exists());
    assert_eq!(store.snapshot().version, crate::state::CURRENT_STATE_VERSION);
}

#[test]
fn mutate_persists_across_reopen() {
    let (_dir, path) = temp_state_path();
    let store = StateStore::open(&path).unwrap();

    let project = Project::builder().name("demo").build();
    let project_id = project.id.to_string();
    store
        .mutate(|state| {
            state.projects.insert(project_id.clone(), project);
            Ok(())
        })
        .unwrap();

    let reopened = StateStore::open(&path).unwrap();
    assert!(reopened.snapshot().projects.contains_key(&project_id));
}

#[test]
fn mutate_aborts_write_on_error() {
    let (_dir, path) = temp_state_path();
    let store = StateStore::open(&path).unwrap();

    let before = store.snapshot();
    let result: Result<(), HubError> = store.mutate(|state| {
        state.projects.insert("proj-bogus".into(), Project::builder().build());
        Err(HubError::config("deliberate failure"))
    });

    assert!(result.is_err());
    assert_eq!(store.snapshot().projects.len(), before.projects.len());
}

#[test]
fn write_rotates_backup_file() {
    let (_dir, path) = temp_state_path();
    let store = StateStore::open(&path).unwrap();
    store.mutate(|state| {
        state.projects.insert("proj-a".into(), Project::builder().build());
        Ok(())
    }).unwrap();

    let bak = path.with_extension("bak");
    assert!(bak.exists());
}
