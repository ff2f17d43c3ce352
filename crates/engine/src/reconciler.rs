// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup Reconciler: runs once on hub start and makes every persisted
//! record consistent with what is actually alive on the machine. No chat
//! claims a pid the hub no longer owns, no chat/project workspace or
//! artifact directory sits orphaned, no log file belongs to an unknown id,
//! and no container under the hub's own naming scheme lingers stopped.

use agent_hub_core::{ChatStatus, HubResult};
use agent_hub_storage::StateStore;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a recorded pid is given to exit after SIGTERM before SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(4);

/// Container name prefixes the hub itself creates. Anything outside these
/// prefixes is left alone regardless of its state.
pub const CHAT_CONTAINER_PREFIX: &str = "agent-hub-chat-";
pub const SETUP_CONTAINER_PREFIX: &str = "agent-hub-setup-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub name: String,
    pub running: bool,
}

/// Lists and removes docker containers by name prefix. Kept as an injected
/// seam, the same way [`crate::build_pipeline::ImageInspector`] is, so the
/// sweep logic is testable without a real docker daemon.
#[async_trait]
pub trait ContainerInspector: Send + Sync {
    async fn list_containers(&self, name_prefix: &str) -> HubResult<Vec<ContainerInfo>>;
    async fn remove_container(&self, name: &str) -> HubResult<()>;
}

/// Probes and signals a raw OS pid recorded on a chat before restart.
/// Separate from [`agent_hub_adapters::CommandRunner`]: this checks the
/// hub's own process table directly rather than running a subprocess to
/// completion.
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
    /// SIGTERM the process group, wait up to [`KILL_GRACE`], then SIGKILL.
    fn terminate(&self, pid: u32);
}

#[cfg(unix)]
pub struct SystemProcessProbe;

#[cfg(unix)]
impl ProcessProbe for SystemProcessProbe {
    fn is_alive(&self, pid: u32) -> bool {
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
    }

    fn terminate(&self, pid: u32) {
        let target = nix::unistd::Pid::from_raw(pid as i32);
        let _ = nix::sys::signal::killpg(target, nix::sys::signal::Signal::SIGTERM);

        let deadline = Instant::now() + KILL_GRACE;
        while Instant::now() < deadline {
            if nix::sys::signal::kill(target, None).is_err() {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        let _ = nix::sys::signal::killpg(target, nix::sys::signal::Signal::SIGKILL);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub chats_transitioned: usize,
    pub chat_dirs_removed: usize,
    pub project_dirs_removed: usize,
    pub artifact_dirs_removed: usize,
    pub log_files_removed: usize,
    pub containers_removed: usize,
}

/// Run the full reconcile pass. Idempotent: running it twice back to back
/// against the same filesystem and state produces a report of all zeros
/// the second time.
pub async fn reconcile(store: &StateStore, containers: &dyn ContainerInspector, probe: &dyn ProcessProbe, data_dir: &Path) -> HubResult<ReconcileReport> {
    let before = store.snapshot();
    for chat in before.chats.values() {
        if let Some(pid) = chat.pid {
            if probe.is_alive(pid) {
                probe.terminate(pid);
            }
        }
    }

    let mut chats_transitioned = 0usize;
    store.mutate(|state| {
        let now = chrono::Utc::now();
        for chat in state.chats.values_mut() {
            if !matches!(chat.status, ChatStatus::Running | ChatStatus::Starting) {
                continue;
            }

            if chat.stop_requested_at.is_some() {
                chat.transition(ChatStatus::Stopped, "startup reconciler observed no live process after an explicit stop request", now);
            } else {
                chat.transition(ChatStatus::Failed, "startup reconciler observed no live process at boot", now);
            }

            chat.pid = None;
            chat.agent_tools_token_hash = None;
            chat.artifact_publish_token_hash = None;
            chat.ready_ack_guid = None;
            chat.ready_ack_stage = None;
            chat.ready_ack_at = None;
            chat.ready_ack_meta = None;
            chats_transitioned += 1;
        }
        Ok(())
    })?;

    let after = store.snapshot();
    let chat_ids: HashSet<String> = after.chats.keys().cloned().collect();
    let project_ids: HashSet<String> = after.projects.keys().cloned().collect();

    let chat_dirs_removed = sweep_unreferenced_children(&data_dir.join("chats"), &chat_ids)?;
    let project_dirs_removed = sweep_unreferenced_children(&data_dir.join("projects"), &project_ids)?;
    let artifact_dirs_removed = sweep_unreferenced_children(&data_dir.join("artifacts").join("chats"), &chat_ids)?;

    let logs_dir = data_dir.join("logs");
    let log_files_removed = sweep_log_subdir(&logs_dir.join("chats"), &chat_ids)? + sweep_log_subdir(&logs_dir.join("projects"), &project_ids)?;

    let containers_removed = sweep_containers(containers, CHAT_CONTAINER_PREFIX).await? + sweep_containers(containers, SETUP_CONTAINER_PREFIX).await?;

    Ok(ReconcileReport { chats_transitioned, chat_dirs_removed, project_dirs_removed, artifact_dirs_removed, log_files_removed, containers_removed })
}

fn sweep_unreferenced_children(dir: &Path, referenced: &HashSet<String>) -> HubResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if referenced.contains(&name) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}

fn sweep_log_subdir(dir: &Path, referenced: &HashSet<String>) -> HubResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        if referenced.contains(stem) {
            continue;
        }
        std::fs::remove_file(&path)?;
        removed += 1;
    }
    Ok(removed)
}

async fn sweep_containers(containers: &dyn ContainerInspector, prefix: &str) -> HubResult<usize> {
    let found = containers.list_containers(prefix).await?;
    let mut removed = 0;
    for container in found {
        if !container.running {
            containers.remove_container(&container.name).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
