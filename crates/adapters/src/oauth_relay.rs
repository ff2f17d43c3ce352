// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth Callback Relay: proxies a browser's OAuth callback
//! into a login container's loopback-bound server, since the browser itself
//! cannot reach container loopback.

use crate::command_runner::CommandRunner;
use agent_hub_core::{HubError, HubResult};
use std::collections::HashMap;
use std::time::Duration;

const PER_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailureReason {
    Timeout,
    ConnectionRefused,
    DnsResolutionFailed,
    NetworkUnreachable,
    Other(String),
}

impl TransportFailureReason {
    fn label(&self) -> String {
        match self {
            Self::Timeout => "timeout".to_string(),
            Self::ConnectionRefused => "connection_refused".to_string(),
            Self::DnsResolutionFailed => "dns_resolution_failed".to_string(),
            Self::NetworkUnreachable => "network_unreachable".to_string(),
            Self::Other(s) => s.clone(),
        }
    }

    fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            let msg = err.to_string();
            if msg.contains("dns") {
                Self::DnsResolutionFailed
            } else if msg.contains("refused") {
                Self::ConnectionRefused
            } else if msg.contains("unreachable") {
                Self::NetworkUnreachable
            } else {
                Self::Other(msg)
            }
        } else {
            Self::Other(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallbackRelayOutcome {
    pub status_code: u16,
    pub body: String,
}

/// Parse the Linux default route's gateway out of `/proc/net/route`: the
/// `Gateway` field on the row whose `Destination` is `00000000`, stored as
/// little-endian hex.
pub fn default_gateway() -> Option<String> {
    let contents = std::fs::read_to_string("/proc/net/route").ok()?;
    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[1] != "00000000" {
            continue;
        }
        let raw = u32::from_str_radix(fields[2], 16).ok()?;
        let [a, b, c, d] = raw.to_le_bytes();
        return Some(format!("{a}.{b}.{c}.{d}"));
    }
    None
}

/// Query the `bridge` network's gateway address via `docker network
/// inspect`, formatted down to just the field this relay needs.
pub async fn docker_bridge_gateway(runner: &dyn CommandRunner) -> Option<String> {
    let args = [
        "network".to_string(),
        "inspect".to_string(),
        "bridge".to_string(),
        "--format".to_string(),
        "{{range .IPAM.Config}}{{.Gateway}}{{end}}".to_string(),
    ];
    let output = runner.run("docker", &args, &HashMap::new()).await.ok()?;
    if !output.status_success {
        return None;
    }
    let gateway = output.stdout.trim();
    (!gateway.is_empty()).then(|| gateway.to_string())
}

/// Build the ranked, deduplicated candidate host list: artifact publish
/// base host, Linux default gateway, docker bridge gateway, in that order.
pub fn candidate_hosts(artifact_publish_host: Option<&str>, default_gateway: Option<&str>, docker_bridge_gateway: Option<&str>) -> Vec<String> {
    let mut hosts = Vec::new();
    for candidate in [artifact_publish_host, default_gateway, docker_bridge_gateway].into_iter().flatten() {
        if !hosts.iter().any(|h: &String| h == candidate) {
            hosts.push(candidate.to_string());
        }
    }
    hosts
}

/// Probe one candidate host: a non-transport-failure response (2xx/3xx/4xx)
/// is a terminal success from the relay's perspective even if it is itself
/// an error page — the callback was delivered.
pub async fn probe_callback_host(
    client: &reqwest::Client,
    host: &str,
    port: u16,
    path: &str,
    query: &str,
) -> Result<CallbackRelayOutcome, TransportFailureReason> {
    let url = format!("http://{host}:{port}{path}?{query}");
    let response = tokio::time::timeout(PER_ATTEMPT_TIMEOUT, client.get(&url).send())
        .await
        .map_err(|_| TransportFailureReason::Timeout)?
        .map_err(|e| TransportFailureReason::classify(&e))?;

    let status_code = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Ok(CallbackRelayOutcome { status_code, body })
}

/// Run the full relay: try every candidate host, then the docker-exec
/// fallback, then fail with `NETWORK_REACHABILITY_ERROR` summarizing every
/// attempted origin (never the query values).
pub async fn relay_callback(
    client: &reqwest::Client,
    hosts: &[String],
    port: u16,
    path: &str,
    query_keys: &[String],
    query: &str,
    docker_exec_fallback: impl std::future::Future<Output = Result<CallbackRelayOutcome, TransportFailureReason>>,
) -> HubResult<CallbackRelayOutcome> {
    let mut attempts: Vec<(String, TransportFailureReason)> = Vec::new();

    for host in hosts {
        match probe_callback_host(client, host, port, path, query).await {
            Ok(outcome) => return Ok(outcome),
            Err(reason) => attempts.push((host.clone(), reason)),
        }
    }

    match docker_exec_fallback.await {
        Ok(outcome) => return Ok(outcome),
        Err(reason) => attempts.push(("docker_exec".to_string(), reason)),
    }

    let summary = attempts.iter().map(|(origin, reason)| format!("{origin}={}", reason.label())).collect::<Vec<_>>().join(", ");
    Err(HubError::network_reachability(format!(
        "no reachable callback origin for query keys {:?}: {summary}",
        query_keys
    )))
}

#[cfg(test)]
#[path = "oauth_relay_tests.rs"]
mod tests;
