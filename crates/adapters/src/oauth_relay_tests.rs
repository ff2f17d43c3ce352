// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::command_runner::fake::FakeCommandRunner;

#[tokio::test]
async fn docker_bridge_gateway_extracts_the_formatted_field() {
    let runner = FakeCommandRunner::new(vec![Ok(crate::CommandOutput {
        status_success: true,
        status_code: 0,
        stdout: "172.17.0.1\n".to_string(),
        stderr: String::new(),
    })]);
    assert_eq!(docker_bridge_gateway(&runner).await, Some("172.17.0.1".to_string()));
}

#[tokio::test]
async fn docker_bridge_gateway_is_none_when_docker_fails() {
    let runner = FakeCommandRunner::always_fail("no such network");
    assert_eq!(docker_bridge_gateway(&runner).await, None);
}

#[test]
fn candidate_hosts_dedupes_while_preserving_order() {
    let hosts = candidate_hosts(Some("pub.example.com"), Some("172.17.0.1"), Some("172.17.0.1"));
    assert_eq!(hosts, vec!["pub.example.com".to_string(), "172.17.0.1".to_string()]);
}

#[test]
fn candidate_hosts_skips_absent_candidates() {
    let hosts = candidate_hosts(None, Some("172.17.0.1"), None);
    assert_eq!(hosts, vec!["172.17.0.1".to_string()]);
}

#[tokio::test]
async fn probe_callback_host_classifies_connection_refused_when_nothing_listens() {
    let client = reqwest::Client::new();
    let result = probe_callback_host(&client, "127.0.0.1", 9, "/callback", "code=abc").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn relay_callback_falls_back_to_docker_exec_when_every_host_fails() {
    let client = reqwest::Client::new();
    let hosts = vec!["127.0.0.1".to_string()];
    let outcome = relay_callback(
        &client,
        &hosts,
        9, // discard port, guaranteed closed
        "/callback",
        &["code".to_string(), "state".to_string()],
        "code=abc&state=xyz",
        async { Ok(CallbackRelayOutcome { status_code: 200, body: "ok".to_string() }) },
    )
    .await
    .unwrap();

    assert_eq!(outcome.status_code, 200);
}

#[tokio::test]
async fn relay_callback_raises_network_reachability_error_when_everything_fails() {
    let client = reqwest::Client::new();
    let hosts = vec!["127.0.0.1".to_string()];
    let err = relay_callback(
        &client,
        &hosts,
        9,
        "/callback",
        &["code".to_string(), "state".to_string()],
        "code=abc&state=xyz",
        async { Err(TransportFailureReason::ConnectionRefused) },
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), "NETWORK_REACHABILITY_ERROR");
}
