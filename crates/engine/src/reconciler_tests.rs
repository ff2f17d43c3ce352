// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::{Chat, ChatStatus, Project};
use async_trait::async_trait;
use parking_lot::Mutex as PLMutex;

struct NeverAlive;

impl ProcessProbe for NeverAlive {
    fn is_alive(&self, _pid: u32) -> bool {
        false
    }
    fn terminate(&self, _pid: u32) {}
}

/// Fails the test if asked to terminate: proves the reconciler never signals
/// a pid it already found dead.
struct PanicsOnTerminate;

impl ProcessProbe for PanicsOnTerminate {
    fn is_alive(&self, _pid: u32) -> bool {
        false
    }
    fn terminate(&self, _pid: u32) {
        panic!("should not terminate a pid that was never alive");
    }
}

struct NoContainers;

#[async_trait]
impl ContainerInspector for NoContainers {
    async fn list_containers(&self, _name_prefix: &str) -> HubResult<Vec<ContainerInfo>> {
        Ok(Vec::new())
    }
    async fn remove_container(&self, _name: &str) -> HubResult<()> {
        Ok(())
    }
}

/// Records which containers were asked to be removed.
struct FakeContainers {
    containers: Vec<ContainerInfo>,
    removed: PLMutex<Vec<String>>,
}

#[async_trait]
impl ContainerInspector for FakeContainers {
    async fn list_containers(&self, name_prefix: &str) -> HubResult<Vec<ContainerInfo>> {
        Ok(self.containers.iter().filter(|c| c.name.starts_with(name_prefix)).cloned().collect())
    }
    async fn remove_container(&self, name: &str) -> HubResult<()> {
        self.removed.lock().push(name.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn reconcile_transitions_a_running_chat_with_no_live_pid_to_failed() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let chat = Chat::builder().status(ChatStatus::Running).pid(Some(4242)).build();
    let chat_id = chat.id.clone();
    store.mutate(|state| { state.chats.insert(chat_id.as_str().to_string(), chat.clone()); Ok(()) }).unwrap();

    let report = reconcile(&store, &NoContainers, &NeverAlive, &data_dir).await.unwrap();

    assert_eq!(report.chats_transitioned, 1);
    let updated = store.snapshot().chats.get(chat_id.as_str()).cloned().unwrap();
    assert_eq!(updated.status, ChatStatus::Failed);
    assert!(updated.pid.is_none());
    assert!(updated.start_error.is_none());
}

#[tokio::test]
async fn reconcile_transitions_to_stopped_when_a_stop_was_already_requested() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let chat = Chat::builder().status(ChatStatus::Running).pid(Some(99)).stop_requested_at(Some(chrono::Utc::now())).build();
    let chat_id = chat.id.clone();
    store.mutate(|state| { state.chats.insert(chat_id.as_str().to_string(), chat.clone()); Ok(()) }).unwrap();

    reconcile(&store, &NoContainers, &NeverAlive, &data_dir).await.unwrap();

    let updated = store.snapshot().chats.get(chat_id.as_str()).cloned().unwrap();
    assert_eq!(updated.status, ChatStatus::Stopped);
}

#[tokio::test]
async fn reconcile_clears_tokens_and_ack_state_on_every_reconciled_chat() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let chat = Chat::builder()
        .status(ChatStatus::Running)
        .pid(Some(7))
        .agent_tools_token_hash(Some("hash".to_string()))
        .artifact_publish_token_hash(Some("hash".to_string()))
        .ready_ack_guid(Some("guid".to_string()))
        .build();
    let chat_id = chat.id.clone();
    store.mutate(|state| { state.chats.insert(chat_id.as_str().to_string(), chat.clone()); Ok(()) }).unwrap();

    reconcile(&store, &NoContainers, &NeverAlive, &data_dir).await.unwrap();

    let updated = store.snapshot().chats.get(chat_id.as_str()).cloned().unwrap();
    assert!(updated.agent_tools_token_hash.is_none());
    assert!(updated.artifact_publish_token_hash.is_none());
    assert!(updated.ready_ack_guid.is_none());
}

#[tokio::test]
async fn reconcile_leaves_an_already_terminal_chat_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let chat = Chat::builder().status(ChatStatus::Stopped).build();
    let chat_id = chat.id.clone();
    store.mutate(|state| { state.chats.insert(chat_id.as_str().to_string(), chat.clone()); Ok(()) }).unwrap();

    let report = reconcile(&store, &NoContainers, &PanicsOnTerminate, &data_dir).await.unwrap();

    assert_eq!(report.chats_transitioned, 0);
}

#[tokio::test]
async fn reconcile_sweeps_unreferenced_chat_and_project_and_artifact_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let project = Project::builder().build();
    let project_id = project.id.clone();
    let chat = Chat::builder().project_id(project_id.clone()).build();
    let chat_id = chat.id.clone();
    store
        .mutate(|state| {
            state.projects.insert(project_id.as_str().to_string(), project.clone());
            state.chats.insert(chat_id.as_str().to_string(), chat.clone());
            Ok(())
        })
        .unwrap();

    std::fs::create_dir_all(data_dir.join("chats").join(chat_id.as_str())).unwrap();
    std::fs::create_dir_all(data_dir.join("chats").join("orphan-chat")).unwrap();
    std::fs::create_dir_all(data_dir.join("projects").join(project_id.as_str())).unwrap();
    std::fs::create_dir_all(data_dir.join("projects").join("orphan-project")).unwrap();
    std::fs::create_dir_all(data_dir.join("artifacts").join("chats").join(chat_id.as_str())).unwrap();
    std::fs::create_dir_all(data_dir.join("artifacts").join("chats").join("orphan-chat")).unwrap();

    let report = reconcile(&store, &NoContainers, &NeverAlive, &data_dir).await.unwrap();

    assert_eq!(report.chat_dirs_removed, 1);
    assert_eq!(report.project_dirs_removed, 1);
    assert_eq!(report.artifact_dirs_removed, 1);
    assert!(data_dir.join("chats").join(chat_id.as_str()).exists());
    assert!(!data_dir.join("chats").join("orphan-chat").exists());
    assert!(data_dir.join("projects").join(project_id.as_str()).exists());
    assert!(!data_dir.join("projects").join("orphan-project").exists());
}

#[tokio::test]
async fn reconcile_sweeps_log_files_for_unknown_chat_and_project_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let chat = Chat::builder().build();
    let chat_id = chat.id.clone();
    store.mutate(|state| { state.chats.insert(chat_id.as_str().to_string(), chat.clone()); Ok(()) }).unwrap();

    std::fs::create_dir_all(data_dir.join("logs").join("chats")).unwrap();
    std::fs::create_dir_all(data_dir.join("logs").join("projects")).unwrap();
    std::fs::write(data_dir.join("logs").join("chats").join(format!("{}.log", chat_id.as_str())), "kept").unwrap();
    std::fs::write(data_dir.join("logs").join("chats").join("orphan.log"), "stale").unwrap();
    std::fs::write(data_dir.join("logs").join("projects").join("orphan-project.log"), "stale").unwrap();

    let report = reconcile(&store, &NoContainers, &NeverAlive, &data_dir).await.unwrap();

    assert_eq!(report.log_files_removed, 2);
    assert!(data_dir.join("logs").join("chats").join(format!("{}.log", chat_id.as_str())).exists());
    assert!(!data_dir.join("logs").join("chats").join("orphan.log").exists());
}

#[tokio::test]
async fn reconcile_removes_only_stopped_containers_under_the_hubs_prefixes() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let containers = FakeContainers {
        containers: vec![
            ContainerInfo { name: "agent-hub-chat-abc".to_string(), running: false },
            ContainerInfo { name: "agent-hub-chat-def".to_string(), running: true },
            ContainerInfo { name: "agent-hub-setup-ghi".to_string(), running: false },
            ContainerInfo { name: "unrelated-container".to_string(), running: false },
        ],
        removed: PLMutex::new(Vec::new()),
    };

    let report = reconcile(&store, &containers, &NeverAlive, &data_dir).await.unwrap();

    assert_eq!(report.containers_removed, 2);
    let removed = containers.removed.lock();
    assert!(removed.contains(&"agent-hub-chat-abc".to_string()));
    assert!(removed.contains(&"agent-hub-setup-ghi".to_string()));
    assert!(!removed.contains(&"agent-hub-chat-def".to_string()));
}

#[tokio::test]
async fn reconcile_is_idempotent_on_a_second_back_to_back_run() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().to_path_buf();
    let store = StateStore::open(data_dir.join("state.json")).unwrap();

    let chat = Chat::builder().status(ChatStatus::Running).pid(Some(1)).build();
    let chat_id = chat.id.clone();
    store.mutate(|state| { state.chats.insert(chat_id.as_str().to_string(), chat.clone()); Ok(()) }).unwrap();
    std::fs::create_dir_all(data_dir.join("chats").join("orphan")).unwrap();

    reconcile(&store, &NoContainers, &NeverAlive, &data_dir).await.unwrap();
    let second = reconcile(&store, &NoContainers, &NeverAlive, &data_dir).await.unwrap();

    assert_eq!(second, ReconcileReport::default());
}
