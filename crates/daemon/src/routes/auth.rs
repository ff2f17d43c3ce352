// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth Provider Adapters (D): OpenAI API key / ChatGPT account, GitHub
//! App manifest flow + installation tokens, GitHub/GitLab PATs. Every
//! mutation here ends with a `state.events.publish(HubEvent::AuthChanged)`,
//! mirroring how [`agent_hub_engine::build_pipeline::BuildWorker`] only
//! publishes after a successful state-store write.

use crate::adapters::{
    load_github_app_installation, load_pat_tokens, remove_github_app_installation, store_github_app_installation,
    store_github_app_settings, store_pat_tokens, GithubAppInstallationRecord, GithubAppSettings, PatTokenRecord,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use agent_hub_adapters::{candidate_hosts, default_gateway, docker_bridge_gateway, relay_callback, CallbackRelayOutcome, GithubAppClient, TransportFailureReason};
use agent_hub_core::enums::{CredentialKind, OAuthLoginMethod, OAuthLoginStatus, Provider};
use agent_hub_core::{new_pat_credential_id, CredentialId, CredentialRecord, HubError, OAuthLoginSession};
use agent_hub_storage::HubEvent;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn publish_auth_changed(state: &AppState, reason: &str) {
    state.events.publish(HubEvent::AuthChanged { provider: reason.to_string(), at: chrono::Utc::now() });
}

#[derive(Serialize)]
pub struct AuthStatus {
    openai_api_key_connected: bool,
    openai_account_connected: bool,
    github_app_configured: bool,
    github_app_installation: Option<GithubAppInstallationRecord>,
    github_tokens: Vec<PatTokenRecord>,
    gitlab_tokens: Vec<PatTokenRecord>,
}

pub async fn get_auth_status(State(state): State<AppState>) -> Json<AuthStatus> {
    Json(AuthStatus {
        openai_api_key_connected: state.openai.resolve().is_some(),
        openai_account_connected: state.openai.codex_home().join("auth.json").exists(),
        github_app_configured: state.github_app_client.lock().is_some(),
        github_app_installation: load_github_app_installation(&state.data_dir),
        github_tokens: load_pat_tokens(&state.data_dir, "github"),
        gitlab_tokens: load_pat_tokens(&state.data_dir, "gitlab"),
    })
}

#[derive(Deserialize)]
pub struct OpenAiConnectRequest {
    pub api_key: String,
}

pub async fn openai_connect(State(state): State<AppState>, Json(req): Json<OpenAiConnectRequest>) -> ApiResult<Json<serde_json::Value>> {
    state.openai.store_api_key(&req.api_key)?;
    publish_auth_changed(&state, "openai_api_key_connected");
    Ok(Json(serde_json::json!({"connected": true})))
}

pub async fn openai_disconnect(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.openai.disconnect()?;
    publish_auth_changed(&state, "openai_disconnected");
    Ok(Json(serde_json::json!({"connected": false})))
}

/// Exercise the connected credential against a cheap read-only endpoint, the
/// same sanity check the title generator relies on before it ever drafts a
/// title.
pub async fn openai_title_test(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let credentials = state.openai.resolve().ok_or_else(|| HubError::credential_resolution("no OpenAI credentials configured"))?;
    let api_key = match credentials {
        agent_hub_engine::OpenAiCredentials::ApiKey(key) => key,
        agent_hub_engine::OpenAiCredentials::Account { .. } => {
            return Err(ApiError(HubError::Unprocessable("title-test only supports an API key credential".to_string())));
        }
    };

    let response = state
        .http_client
        .get("https://api.openai.com/v1/models")
        .bearer_auth(api_key)
        .send()
        .await
        .map_err(|e| HubError::Upstream(format!("openai request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ApiError(HubError::Upstream(format!("openai rejected the credential: {}", response.status()))));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

const LOGIN_CONTAINER_IMAGE: &str = "agent-hub-login:latest";
const LOGIN_TAIL_INTERVAL_SECONDS: u64 = 2;
const LOGIN_TIMEOUT_SECONDS: i64 = 600;

#[derive(Deserialize, Default)]
pub struct OpenAiAccountStartRequest {
    #[serde(default)]
    pub device_auth: bool,
}

/// Spawn a login container running `codex login [--device-auth]` and start
/// a background tailer that scans its log output for the login URL or
/// device code, same detection surface the original adapter describes for
/// §3's login-container approach.
pub async fn openai_account_start(State(state): State<AppState>, Json(req): Json<OpenAiAccountStartRequest>) -> ApiResult<Json<OAuthLoginSession>> {
    let now = chrono::Utc::now();
    let method = if req.device_auth { OAuthLoginMethod::DeviceAuth } else { OAuthLoginMethod::BrowserCallback };
    let id = agent_hub_core::OAuthLoginSessionId::new();
    let container_name = format!("agent-hub-login-{}", id.as_str());

    let mut argv = vec!["run".to_string(), "--detach".to_string(), "--name".to_string(), container_name.clone(), LOGIN_CONTAINER_IMAGE.to_string(), "codex".to_string(), "login".to_string()];
    if req.device_auth {
        argv.push("--device-auth".to_string());
    }

    let env = HashMap::new();
    let output = state.runner.run("docker", &argv, &env).await.map_err(|e| HubError::Internal(format!("failed to spawn login container: {e}")))?;
    let session = if output.status_success {
        OAuthLoginSession {
            id,
            method,
            status: OAuthLoginStatus::Running,
            status_reason: "login container started".to_string(),
            container_name: Some(container_name.clone()),
            authorize_url: None,
            device_code: None,
            device_verification_url: None,
            callback_host: None,
            callback_port: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    } else {
        OAuthLoginSession {
            id,
            method,
            status: OAuthLoginStatus::Failed,
            status_reason: "failed to start login container".to_string(),
            container_name: None,
            authorize_url: None,
            device_code: None,
            device_verification_url: None,
            callback_host: None,
            callback_port: None,
            error: Some(output.stderr.trim().to_string()),
            created_at: now,
            updated_at: now,
        }
    };

    state.oauth_logins.insert(session.clone());
    if session.status == OAuthLoginStatus::Running {
        spawn_login_tailer(state.clone(), session.id.as_str().to_string(), container_name);
    }
    publish_auth_changed(&state, "openai_account_login_started");
    Ok(Json(session))
}

fn spawn_login_tailer(state: AppState, session_id: String, container_name: String) {
    tokio::spawn(async move {
        let started = chrono::Utc::now();
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(LOGIN_TAIL_INTERVAL_SECONDS));
        loop {
            interval.tick().await;
            let Some(session) = state.oauth_logins.get(&session_id) else { return };
            if session.is_terminal() {
                return;
            }
            if chrono::Utc::now() - started > chrono::Duration::seconds(LOGIN_TIMEOUT_SECONDS) {
                state.oauth_logins.update(&session_id, |s| s.transition(OAuthLoginStatus::Failed, "timed out waiting for login", chrono::Utc::now()));
                publish_auth_changed(&state, "openai_account_login_timed_out");
                return;
            }

            let env = HashMap::new();
            let Ok(logs) = state.runner.run("docker", &["logs".to_string(), container_name.clone()], &env).await else { continue };
            let combined = format!("{}\n{}", logs.stdout, logs.stderr);

            for line in combined.lines() {
                if let Some(url) = extract_login_url(line) {
                    state.oauth_logins.update(&session_id, |s| {
                        if s.authorize_url.is_none() {
                            s.authorize_url = Some(url.clone());
                            s.transition(OAuthLoginStatus::WaitingForBrowser, "login URL detected", chrono::Utc::now());
                        }
                    });
                }
                if let Some(code) = extract_device_code(line) {
                    state.oauth_logins.update(&session_id, |s| {
                        if s.device_code.is_none() {
                            s.device_code = Some(code.clone());
                            s.transition(OAuthLoginStatus::WaitingForDeviceCode, "device code detected", chrono::Utc::now());
                        }
                    });
                }
            }

            let inspect = state.runner.run("docker", &["inspect".to_string(), "--format".to_string(), "{{.State.Running}}".to_string(), container_name.clone()], &env).await;
            let still_running = matches!(inspect, Ok(ref out) if out.status_success && out.stdout.trim() == "true");
            if !still_running {
                let success = state.openai.codex_home().join("auth.json").exists();
                state.oauth_logins.update(&session_id, |s| {
                    if success {
                        s.transition(OAuthLoginStatus::Connected, "codex login completed", chrono::Utc::now());
                    } else {
                        s.transition(OAuthLoginStatus::Failed, "login container exited without a valid session", chrono::Utc::now());
                    }
                });
                let _ = state.runner.run("docker", &["rm".to_string(), "--force".to_string(), container_name.clone()], &env).await;
                publish_auth_changed(&state, "openai_account_login_finished");
                return;
            }
        }
    });
}

/// Heuristics mirroring the provider hostnames and redirect marker the
/// login flow actually emits.
fn extract_login_url(line: &str) -> Option<String> {
    line.split_whitespace()
        .find(|token| token.starts_with("http") && (token.contains("auth.openai.com") || token.contains("auth.chatgpt.com") || token.contains("chatgpt.com")) && token.contains("redirect_uri="))
        .map(|s| s.trim_matches(|c: char| !c.is_ascii_graphic()).to_string())
}

fn extract_device_code(line: &str) -> Option<String> {
    line.split_whitespace().find(|token| {
        let bytes = token.as_bytes();
        bytes.len() == 9 && bytes[4] == b'-' && bytes[..4].iter().all(u8::is_ascii_alphanumeric) && bytes[5..].iter().all(u8::is_ascii_alphanumeric)
    }).map(|s| s.to_string())
}

pub async fn openai_account_cancel(State(state): State<AppState>, Json(req): Json<SessionIdRequest>) -> ApiResult<Json<serde_json::Value>> {
    let session = state.oauth_logins.get(&req.session_id).ok_or_else(|| HubError::NotFound("no such login session".to_string()))?;
    if let Some(name) = &session.container_name {
        let env = HashMap::new();
        let _ = state.runner.run("docker", &["rm".to_string(), "--force".to_string(), name.clone()], &env).await;
    }
    state.oauth_logins.update(&req.session_id, |s| s.transition(OAuthLoginStatus::Cancelled, "cancelled by caller", chrono::Utc::now()));
    publish_auth_changed(&state, "openai_account_login_cancelled");
    Ok(Json(serde_json::json!({"cancelled": true})))
}

#[derive(Deserialize)]
pub struct SessionIdRequest {
    pub session_id: String,
}

pub async fn openai_account_session(State(state): State<AppState>, Json(req): Json<SessionIdRequest>) -> ApiResult<Json<OAuthLoginSession>> {
    let session = state.oauth_logins.get(&req.session_id).ok_or_else(|| HubError::NotFound("no such login session".to_string()))?;
    Ok(Json(session))
}

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub params: HashMap<String, String>,
}

/// Relay the browser's OAuth redirect into the login container's loopback
/// server, trying every candidate host in order and a docker-exec fallback
/// before giving up with `NETWORK_REACHABILITY_ERROR`.
pub async fn openai_account_callback(State(state): State<AppState>, Query(query): Query<OAuthCallbackQuery>) -> ApiResult<Json<serde_json::Value>> {
    let session_id = query.session_id.clone().ok_or_else(|| HubError::BadRequest("missing session_id".to_string()))?;
    let session = state.oauth_logins.get(&session_id).ok_or_else(|| HubError::NotFound("no such login session".to_string()))?;
    let port = session.callback_port.unwrap_or(1455);

    let query_string = query.params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    let query_keys: Vec<String> = query.params.keys().cloned().collect();
    let bridge_gateway = docker_bridge_gateway(state.runner.as_ref()).await;
    let hosts = candidate_hosts(Some("127.0.0.1"), default_gateway().as_deref(), bridge_gateway.as_deref());

    let container_name = session.container_name.clone();
    let runner = state.runner.clone();
    let docker_exec_fallback = async move {
        let Some(name) = container_name else {
            return Err(TransportFailureReason::Other("no login container for this session".to_string()));
        };
        let env = HashMap::new();
        let url = format!("http://127.0.0.1:{port}/callback?{query_string}");
        runner
            .run("docker", &["exec".to_string(), name, "curl".to_string(), "-s".to_string(), "-o".to_string(), "/dev/null".to_string(), "-w".to_string(), "%{http_code}".to_string(), url], &env)
            .await
            .map_err(|e| TransportFailureReason::Other(e.to_string()))
            .and_then(|out| if out.status_success { Ok(CallbackRelayOutcome { status_code: out.stdout.trim().parse().unwrap_or(200), body: String::new() }) } else { Err(TransportFailureReason::Other(out.stderr)) })
    };

    let outcome = relay_callback(&state.http_client, &hosts, port, "/callback", &query_keys, &query_string, docker_exec_fallback).await?;
    state.oauth_logins.update(&session_id, |s| s.transition(OAuthLoginStatus::CallbackReceived, "callback delivered", chrono::Utc::now()));
    publish_auth_changed(&state, "openai_account_callback_relayed");
    Ok(Json(serde_json::json!({"status_code": outcome.status_code})))
}

#[derive(Serialize)]
pub struct GithubAppSetupStart {
    setup_url: String,
    session_id: String,
}

pub async fn github_app_setup_start(State(state): State<AppState>) -> ApiResult<Json<GithubAppSetupStart>> {
    let github_app = state.config.github_app();
    let web_base = github_app.and_then(|g| g.web_base_url.clone()).unwrap_or_else(|| "https://github.com".to_string());

    let state_nonce = nanoid::nanoid!(32);
    let id = agent_hub_core::OAuthLoginSessionId::new();
    let now = chrono::Utc::now();

    state.github_app_setup_states.lock().insert(id.as_str().to_string(), state_nonce.clone());
    state.oauth_logins.insert(OAuthLoginSession {
        id: id.clone(),
        method: OAuthLoginMethod::BrowserCallback,
        status: OAuthLoginStatus::WaitingForBrowser,
        status_reason: "waiting for the manifest form to be submitted".to_string(),
        container_name: None,
        authorize_url: None,
        device_code: None,
        device_verification_url: None,
        callback_host: None,
        callback_port: None,
        error: None,
        created_at: now,
        updated_at: now,
    });

    Ok(Json(GithubAppSetupStart { setup_url: format!("{web_base}/settings/apps/new?state={state_nonce}"), session_id: id.as_str().to_string() }))
}

pub async fn github_app_setup_session(State(state): State<AppState>, Json(req): Json<SessionIdRequest>) -> ApiResult<Json<OAuthLoginSession>> {
    let session = state.oauth_logins.get(&req.session_id).ok_or_else(|| HubError::NotFound("no such setup session".to_string()))?;
    Ok(Json(session))
}

#[derive(Deserialize)]
pub struct GithubAppSetupCallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Deserialize)]
struct ManifestConversionResponse {
    id: u64,
    slug: String,
    pem: String,
    html_url: String,
}

pub async fn github_app_setup_callback(State(state): State<AppState>, Query(query): Query<GithubAppSetupCallbackQuery>) -> ApiResult<Json<serde_json::Value>> {
    let session_id = {
        let states = state.github_app_setup_states.lock();
        states.iter().find(|(_, nonce)| constant_time_eq(nonce, &query.state)).map(|(sid, _)| sid.clone())
    }
    .ok_or_else(|| HubError::CredentialResolution("state nonce did not match any pending setup session".to_string()))?;

    let api_base = state.config.github_app().and_then(|g| g.api_base_url.clone()).unwrap_or_else(|| "https://api.github.com".to_string());
    let response = state
        .http_client
        .post(format!("{api_base}/app-manifests/{}/conversions", query.code))
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| HubError::Upstream(format!("manifest conversion request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ApiError(HubError::Upstream(format!("github rejected the manifest conversion: {}", response.status()))));
    }
    let converted: ManifestConversionResponse = response.json().await.map_err(|e| HubError::Upstream(format!("invalid manifest conversion response: {e}")))?;

    let settings = GithubAppSettings { id: converted.id.to_string(), slug: converted.slug, pem: converted.pem, html_url: converted.html_url };
    store_github_app_settings(&state.data_dir, &settings)?;
    *state.github_app_client.lock() = Some(std::sync::Arc::new(GithubAppClient::new(settings.id.clone(), settings.pem.clone().into_bytes())));

    state.github_app_setup_states.lock().remove(&session_id);
    state.oauth_logins.update(&session_id, |s| s.transition(OAuthLoginStatus::Connected, "github app configured", chrono::Utc::now()));
    publish_auth_changed(&state, "github_app_configured");

    Ok(Json(serde_json::json!({"id": settings.id, "slug": settings.slug, "html_url": settings.html_url})))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Deserialize)]
struct InstallationListEntry {
    id: u64,
    account: InstallationAccount,
}

#[derive(Deserialize)]
struct InstallationAccount {
    login: String,
}

/// List installations of the configured GitHub App using a freshly minted
/// 9-minute App JWT — never cached, since it's only used here and for a
/// connect call immediately after.
pub async fn github_app_installations(State(state): State<AppState>) -> ApiResult<Json<Vec<serde_json::Value>>> {
    let client = state.github_app_client.lock().clone().ok_or_else(|| HubError::credential_resolution("no GitHub App configured"))?;
    let jwt = client.mint_app_jwt(chrono::Utc::now())?;

    let api_base = state.config.github_app().and_then(|g| g.api_base_url.clone()).unwrap_or_else(|| "https://api.github.com".to_string());
    let response = state
        .http_client
        .get(format!("{api_base}/app/installations"))
        .bearer_auth(jwt)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| HubError::Upstream(format!("github installations request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(ApiError(HubError::Upstream(format!("github rejected the installations request: {}", response.status()))));
    }
    let installations: Vec<InstallationListEntry> = response.json().await.map_err(|e| HubError::Upstream(format!("invalid installations response: {e}")))?;
    Ok(Json(installations.into_iter().map(|i| serde_json::json!({"id": i.id, "account_login": i.account.login})).collect()))
}

#[derive(Deserialize)]
pub struct GithubAppConnectRequest {
    pub installation_id: u64,
}

pub async fn github_app_connect(State(state): State<AppState>, Json(req): Json<GithubAppConnectRequest>) -> ApiResult<Json<serde_json::Value>> {
    let client = state.github_app_client.lock().clone().ok_or_else(|| HubError::credential_resolution("no GitHub App configured"))?;
    let jwt = client.mint_app_jwt(chrono::Utc::now())?;
    let api_base = state.config.github_app().and_then(|g| g.api_base_url.clone()).unwrap_or_else(|| "https://api.github.com".to_string());

    let response = state
        .http_client
        .get(format!("{api_base}/app/installations/{}", req.installation_id))
        .bearer_auth(jwt)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .map_err(|e| HubError::Upstream(format!("github installation lookup failed: {e}")))?;
    if !response.status().is_success() {
        return Err(ApiError(HubError::Upstream(format!("github rejected the installation lookup: {}", response.status()))));
    }
    let entry: InstallationListEntry = response.json().await.map_err(|e| HubError::Upstream(format!("invalid installation response: {e}")))?;

    let record = GithubAppInstallationRecord { installation_id: entry.id, account_login: entry.account.login.clone() };
    store_github_app_installation(&state.data_dir, &record)?;

    let now = chrono::Utc::now();
    let credential = CredentialRecord {
        id: CredentialId::github_app(entry.id),
        kind: CredentialKind::GithubAppInstallation,
        provider: Provider::Github,
        label: entry.account.login,
        host: "github.com".to_string(),
        installation_id: Some(entry.id),
        last_probed_at: None,
        last_probe_ok: None,
        last_probe_error: None,
        created_at: now,
        updated_at: now,
    };
    state.store.mutate(|s| {
        s.credentials.insert(credential.id.as_str().to_string(), credential.clone());
        Ok(())
    })?;

    publish_auth_changed(&state, "github_app_connected");
    Ok(Json(serde_json::json!({"connected": true, "installation_id": record.installation_id})))
}

pub async fn github_app_disconnect(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    if let Some(record) = load_github_app_installation(&state.data_dir) {
        let credential_id = CredentialId::github_app(record.installation_id);
        state.store.mutate(|s| {
            s.credentials.remove(credential_id.as_str());
            Ok(())
        })?;
    }
    remove_github_app_installation(&state.data_dir)?;
    publish_auth_changed(&state, "github_app_disconnected");
    Ok(Json(serde_json::json!({"connected": false})))
}

#[derive(Deserialize)]
pub struct TokenConnectRequest {
    pub token: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

async fn connect_pat(state: &AppState, provider: Provider, req: TokenConnectRequest) -> ApiResult<Json<serde_json::Value>> {
    let default_host = match provider {
        Provider::Github => "github.com",
        Provider::Gitlab => "gitlab.com",
    };
    let host = req.host.unwrap_or_else(|| default_host.to_string());
    let credential_id = new_pat_credential_id();

    state.secrets.store_secret(&credential_id, &req.token)?;

    let now = chrono::Utc::now();
    let label = req.label.unwrap_or_else(|| format!("{provider} token"));
    let credential = CredentialRecord {
        id: credential_id.clone(),
        kind: CredentialKind::PersonalAccessToken,
        provider,
        label: label.clone(),
        host: host.clone(),
        installation_id: None,
        last_probed_at: None,
        last_probe_ok: None,
        last_probe_error: None,
        created_at: now,
        updated_at: now,
    };
    state.store.mutate(|s| {
        s.credentials.insert(credential.id.as_str().to_string(), credential.clone());
        Ok(())
    })?;

    let provider_key = match provider {
        Provider::Github => "github",
        Provider::Gitlab => "gitlab",
    };
    let mut tokens = load_pat_tokens(&state.data_dir, provider_key);
    tokens.push(PatTokenRecord { credential_id: credential_id.as_str().to_string(), provider: provider_key.to_string(), host, label });
    store_pat_tokens(&state.data_dir, provider_key, &tokens)?;

    publish_auth_changed(state, &format!("{provider_key}_token_connected"));
    Ok(Json(serde_json::json!({"credential_id": credential_id.as_str()})))
}

async fn disconnect_pat(state: &AppState, provider_key: &str, credential_id: Option<&str>) -> ApiResult<Json<serde_json::Value>> {
    let mut tokens = load_pat_tokens(&state.data_dir, provider_key);
    let removed: Vec<PatTokenRecord> = match credential_id {
        Some(id) => {
            let mut removed = Vec::new();
            tokens.retain(|t| {
                if t.credential_id == id {
                    removed.push(t.clone());
                    false
                } else {
                    true
                }
            });
            removed
        }
        None => std::mem::take(&mut tokens),
    };

    for token in &removed {
        let id = CredentialId::from(token.credential_id.clone());
        state.secrets.remove_secret(&id)?;
        state.store.mutate(|s| {
            s.credentials.remove(id.as_str());
            Ok(())
        })?;
    }
    store_pat_tokens(&state.data_dir, provider_key, &tokens)?;

    publish_auth_changed(state, &format!("{provider_key}_token_disconnected"));
    Ok(Json(serde_json::json!({"disconnected": removed.len()})))
}

pub async fn github_token_connect(State(state): State<AppState>, Json(req): Json<TokenConnectRequest>) -> ApiResult<Json<serde_json::Value>> {
    connect_pat(&state, Provider::Github, req).await
}

pub async fn github_token_disconnect(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    disconnect_pat(&state, "github", None).await
}

pub async fn gitlab_token_connect(State(state): State<AppState>, Json(req): Json<TokenConnectRequest>) -> ApiResult<Json<serde_json::Value>> {
    connect_pat(&state, Provider::Gitlab, req).await
}

pub async fn gitlab_token_disconnect(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    disconnect_pat(&state, "gitlab", None).await
}

/// Shared `DELETE /api/settings/auth/{github,gitlab}-tokens/:token_id`
/// handler: the path alone doesn't say which provider, so the token id is
/// looked up in whichever catalog has it.
pub async fn token_delete(State(state): State<AppState>, Path(token_id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    for provider_key in ["github", "gitlab"] {
        let tokens = load_pat_tokens(&state.data_dir, provider_key);
        if tokens.iter().any(|t| t.credential_id == token_id) {
            return disconnect_pat(&state, provider_key, Some(&token_id)).await;
        }
    }
    Err(ApiError(HubError::NotFound(format!("no token {token_id}"))))
}
