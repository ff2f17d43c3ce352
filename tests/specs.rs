// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration specs: the invariants, round-trip
//! properties, boundary behaviors, and end-to-end scenarios that cut
//! across crate boundaries rather than living inside a single crate's
//! `#[cfg(test)]` module.

use agent_hub_adapters::launch::{compile_launch_argv, parse_launch_argv, LaunchSpec, Mount};
use agent_hub_adapters::identity::ResolvedIdentity;
use agent_hub_core::{BaseImageMode, CredentialKind, CredentialRecord, Project, Provider};
use agent_hub_engine::{reconcile, ContainerInfo, ContainerInspector, ProcessProbe, ReconcileReport};
use agent_hub_storage::{EventBus, HubEvent, StateStore, State};
use async_trait::async_trait;
use std::path::Path;

// --- Round-trip / idempotence ---------------------------------------------

#[test]
fn launch_argv_round_trips() {
    let spec = LaunchSpec {
        container_name: "agent-hub-chat-demo".to_string(),
        image: "agent-hub-setup-demo-0123456789abcdef".to_string(),
        identity: ResolvedIdentity { uid: 1000, gid: 1000 },
        mounts: vec![
            Mount { host_path: "/rw".to_string(), container_path: "/w".to_string(), read_only: false },
            Mount { host_path: "/ro".to_string(), container_path: "/r".to_string(), read_only: true },
        ],
        env_vars: vec![("K".to_string(), "V".to_string())],
        workdir: "/w".to_string(),
        agent_command: vec!["codex".to_string(), "--model".to_string(), "default".to_string()],
    };

    let argv = compile_launch_argv(&spec);
    let parsed = parse_launch_argv(&argv).expect("compiled argv must parse back");

    assert_eq!(parsed.container_name, spec.container_name);
    assert_eq!(parsed.image, spec.image);
    assert_eq!(parsed.identity, spec.identity);
    assert_eq!(parsed.workdir, spec.workdir);
    assert_eq!(parsed.agent_command, spec.agent_command);

    let mut expected_mounts = spec.mounts.clone();
    expected_mounts.sort_by(|a, b| a.container_path.cmp(&b.container_path));
    let mut actual_mounts = parsed.mounts.clone();
    actual_mounts.sort_by(|a, b| a.container_path.cmp(&b.container_path));
    assert_eq!(actual_mounts, expected_mounts);
}

#[test]
fn fingerprint_is_deterministic_and_sensitive_to_every_input() {
    let base = Project::builder().name("demo").build();
    let same = Project::builder().name("demo").build();
    assert_eq!(base.fingerprint_inputs().setup_script, same.fingerprint_inputs().setup_script);

    let tag_a = agent_hub_core::setup_snapshot_tag("abcd", &base.fingerprint_inputs());
    let tag_b = agent_hub_core::setup_snapshot_tag("abcd", &same.fingerprint_inputs());
    assert_eq!(tag_a, tag_b, "two projects with equal canonical inputs must share a tag");

    let changed = Project::builder().name("demo").build().fingerprint_inputs();
    let mut changed = changed;
    changed.setup_script = "echo changed".to_string();
    let tag_c = agent_hub_core::setup_snapshot_tag("abcd", &changed);
    assert_ne!(tag_a, tag_c, "changing one canonical input must change the tag");
}

#[test]
fn state_normalization_is_idempotent() {
    let mut state = State::default();
    let first_pass_changed = state.normalize();
    let mut normalized_twice = state.clone();
    let second_pass_changed = normalized_twice.normalize();

    assert!(!first_pass_changed, "a fresh default state has nothing to normalize");
    assert!(!second_pass_changed, "normalize(normalize(s)) must change nothing further");
}

#[test]
fn connect_then_disconnect_credential_restores_prior_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StateStore::open(dir.path().join("state.json")).expect("open store");

    let before = store.snapshot().credentials;

    let record = CredentialRecord::builder()
        .id("cred-round-trip")
        .label("test PAT")
        .kind(CredentialKind::PersonalAccessToken)
        .provider(Provider::Github)
        .host("github.com".to_string())
        .build();

    store
        .mutate(|s| {
            s.credentials.insert(record.id.as_str().to_string(), record.clone());
            Ok(())
        })
        .expect("insert credential");
    assert_eq!(store.snapshot().credentials.len(), before.len() + 1);

    store
        .mutate(|s| {
            s.credentials.remove(record.id.as_str());
            Ok(())
        })
        .expect("remove credential");

    assert_eq!(store.snapshot().credentials, before, "catalog must return to its prior state");
}

struct NoContainers;

#[async_trait]
impl ContainerInspector for NoContainers {
    async fn list_containers(&self, _name_prefix: &str) -> agent_hub_core::HubResult<Vec<ContainerInfo>> {
        Ok(Vec::new())
    }
    async fn remove_container(&self, _name: &str) -> agent_hub_core::HubResult<()> {
        Ok(())
    }
}

struct NeverAlive;

impl ProcessProbe for NeverAlive {
    fn is_alive(&self, _pid: u32) -> bool {
        false
    }
    fn terminate(&self, _pid: u32) {}
}

async fn run_reconcile(store: &StateStore, data_dir: &Path) -> ReconcileReport {
    reconcile(store, &NoContainers, &NeverAlive, data_dir).await.expect("reconcile")
}

#[tokio::test]
async fn startup_reconcile_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StateStore::open(dir.path().join("state.json")).expect("open store");

    let first = run_reconcile(&store, dir.path()).await;
    let second = run_reconcile(&store, dir.path()).await;

    assert_eq!(second, ReconcileReport::default(), "a second back-to-back pass must change nothing");
    // Against an empty store the very first pass is already a no-op too.
    assert_eq!(first, ReconcileReport::default());
}

// --- Invariants -------------------------------------------------------------

#[test]
fn event_bus_drains_in_fifo_order() {
    let bus = EventBus::with_capacity(8);
    let sub = bus.subscribe();

    for i in 0..5 {
        bus.publish(HubEvent::StateChanged { reason: format!("event-{i}"), at: chrono::Utc::now() });
    }

    let (drained, lagged) = sub.drain();
    assert!(!lagged);
    let reasons: Vec<String> = drained
        .into_iter()
        .map(|e| match e {
            HubEvent::StateChanged { reason, .. } => reason,
            other => panic!("unexpected event: {other:?}"),
        })
        .collect();
    assert_eq!(reasons, vec!["event-0", "event-1", "event-2", "event-3", "event-4"]);
}

#[test]
fn event_bus_drops_oldest_under_overload() {
    let bus = EventBus::with_capacity(2);
    let sub = bus.subscribe();

    for i in 0..5 {
        bus.publish(HubEvent::StateChanged { reason: format!("event-{i}"), at: chrono::Utc::now() });
    }

    let (drained, lagged) = sub.drain();
    assert!(lagged, "overload must mark the subscriber as lagged");
    let reasons: Vec<String> = drained
        .into_iter()
        .map(|e| match e {
            HubEvent::StateChanged { reason, .. } => reason,
            other => panic!("unexpected event: {other:?}"),
        })
        .collect();
    // Capacity 2: the oldest (event-0, event-1, event-2) are dropped,
    // leaving only the newest two.
    assert_eq!(reasons, vec!["event-3", "event-4"]);
}

// --- Boundary behaviors ------------------------------------------------------

#[test]
fn build_status_resets_when_setup_script_changes_after_ready() {
    use agent_hub_core::BuildStatus;

    let mut project = Project::builder()
        .base_image_mode(BaseImageMode::Tag)
        .build_status(BuildStatus::Ready)
        .build();
    project.setup_snapshot_image = Some(agent_hub_core::setup_snapshot_tag("abcd", &project.fingerprint_inputs()));

    let before_tag = project.setup_snapshot_image.clone();
    project.setup_script = "echo changed".to_string();
    let after_inputs_tag = agent_hub_core::setup_snapshot_tag("abcd", &project.fingerprint_inputs());

    assert_ne!(before_tag, Some(after_inputs_tag), "a changed setup script must no longer match the stored snapshot tag, signalling a rebuild is needed");
}
