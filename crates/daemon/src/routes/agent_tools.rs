// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bearer-authenticated surface the in-container agent calls back
//! into: credential resolution, project binding confirmation, readiness
//! acks, and artifact submission. Reachable both by a chat id (the normal
//! interactive path) and by an ephemeral session id (auto-configure and
//! other one-shot agent_tools invocations with no backing [`Chat`]).

use crate::error::{ApiError, ApiResult};
use crate::routes::hub::require_chat;
use crate::state::AppState;
use agent_hub_adapters::{git_env_for_credential, materialize_credential_file, resolve_candidates};
use agent_hub_core::enums::ReadyAckStage;
use agent_hub_core::HubError;
use agent_hub_engine::{ingest, stage_upload, token_matches, validate_ready_ack, SecretResolver};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

const TOKEN_HEADER: &str = "x-agent-hub-agent-tools-token";

fn presented_token(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError(HubError::CredentialResolution("missing agent_tools bearer token".to_string())))
}

fn require_token(presented: &str, expected: Option<&str>) -> ApiResult<()> {
    let expected = expected.ok_or_else(|| HubError::CredentialResolution("no active agent_tools token for this session".to_string()))?;
    if token_matches(presented, expected) {
        Ok(())
    } else {
        Err(ApiError(HubError::CredentialResolution("invalid agent_tools token".to_string())))
    }
}

#[derive(Serialize)]
pub struct CredentialEnv {
    env: std::collections::HashMap<String, String>,
}

async fn resolve_credential_env(state: &AppState, project_id: &str) -> ApiResult<CredentialEnv> {
    let snapshot = state.store.snapshot();
    let project = snapshot.projects.get(project_id).cloned().ok_or_else(|| HubError::NotFound("project not found".to_string()))?;
    let candidates = resolve_candidates(&project.credential_binding, &snapshot.credentials);
    let Some(credential) = candidates.first() else {
        return Ok(CredentialEnv { env: std::collections::HashMap::new() });
    };

    let secret = state.secrets.resolve_secret(&credential.id).await?;
    let file = materialize_credential_file(&state.data_dir.join("secrets").join("runtime"), &credential.id, &secret)?;
    Ok(CredentialEnv { env: git_env_for_credential(&file) })
}

/// Resolve the credential(s) bound to a chat's project and return the git
/// environment variables the agent should export before a clone/push.
pub async fn get_credentials(State(state): State<AppState>, Path(id): Path<String>, headers: HeaderMap) -> ApiResult<Json<CredentialEnv>> {
    let token = presented_token(&headers)?;
    let chat = require_chat(&state, &id)?;
    require_token(&token, chat.agent_tools_token_hash.as_deref())?;
    Ok(Json(resolve_credential_env(&state, chat.project_id.as_str()).await?))
}

#[derive(Deserialize)]
pub struct PostCredentialsRequest {
    #[serde(default)]
    pub repo_url: Option<String>,
}

pub async fn post_credentials(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(_req): Json<PostCredentialsRequest>,
) -> ApiResult<Json<CredentialEnv>> {
    get_credentials(State(state), Path(id), headers).await
}

#[derive(Deserialize)]
pub struct ProjectBindingRequest {
    pub project_id: String,
}

pub async fn project_binding(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ProjectBindingRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = presented_token(&headers)?;
    let chat = require_chat(&state, &id)?;
    require_token(&token, chat.agent_tools_token_hash.as_deref())?;
    let bound = chat.project_id.as_str() == req.project_id;
    Ok(Json(serde_json::json!({"bound": bound, "project_id": chat.project_id.as_str()})))
}

#[derive(Deserialize)]
pub struct AckRequest {
    pub guid: String,
    pub stage: ReadyAckStage,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

pub async fn ack(State(state): State<AppState>, Path(id): Path<String>, headers: HeaderMap, Json(req): Json<AckRequest>) -> ApiResult<Json<serde_json::Value>> {
    let token = presented_token(&headers)?;
    let chat = require_chat(&state, &id)?;
    require_token(&token, chat.agent_tools_token_hash.as_deref())?;

    let guid = chat.ready_ack_guid.clone().ok_or_else(|| HubError::Unprocessable("chat is not expecting a readiness ack".to_string()))?;
    if !validate_ready_ack(&guid, &req.guid, req.stage, chat.ready_ack_stage) {
        return Err(ApiError(HubError::Unprocessable("readiness ack rejected: stale guid or out-of-order stage".to_string())));
    }

    let now = chrono::Utc::now();
    state.store.mutate(|s| {
        if let Some(chat) = s.chats.get_mut(&id) {
            chat.ready_ack_stage = Some(req.stage);
            chat.ready_ack_at = Some(now);
            chat.ready_ack_meta = req.meta.clone();
        }
        Ok(())
    })?;

    state
        .events
        .publish(agent_hub_storage::HubEvent::StateChanged { reason: "chat_ready_ack".to_string(), at: now });
    Ok(Json(serde_json::json!({"accepted": true})))
}

#[derive(Deserialize)]
pub struct SubmitArtifactRequest {
    pub source_path: String,
    pub name: String,
}

pub async fn submit_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SubmitArtifactRequest>,
) -> ApiResult<Json<agent_hub_core::Artifact>> {
    let token = presented_token(&headers)?;
    let chat = require_chat(&state, &id)?;
    require_token(&token, chat.artifact_publish_token_hash.as_deref())?;

    let data_dir = state.data_dir.clone();
    let artifact = state.store.mutate(|s| {
        let chat = s.chats.get_mut(&id).ok_or_else(|| HubError::NotFound(format!("no chat {id}")))?;
        let workspace = chat.workspace.clone().unwrap_or_else(|| data_dir.join("projects").join(chat.project_id.as_str()).join("workspace").display().to_string());
        let bytes = std::fs::read(&req.source_path)?;
        let staged = stage_upload(std::path::Path::new(&workspace), &req.name, &bytes)?;
        ingest(chat, &data_dir, &staged, &req.name, chrono::Utc::now()).map_err(HubError::from)
    })?;

    state
        .events
        .publish(agent_hub_storage::HubEvent::StateChanged { reason: "artifact_submitted".to_string(), at: chrono::Utc::now() });
    Ok(Json(artifact))
}

/// Resolve the ephemeral session's credentials the same way a chat does,
/// keyed by `session_id` instead of `chat_id`.
pub async fn session_get_credentials(State(state): State<AppState>, Path(session_id): Path<String>, headers: HeaderMap) -> ApiResult<Json<CredentialEnv>> {
    let token = presented_token(&headers)?;
    let session = state.agent_tools_sessions.get(&session_id).ok_or_else(|| HubError::NotFound(format!("no agent_tools session {session_id}")))?;
    require_token(&token, Some(session.token_hash.as_str()))?;
    Ok(Json(resolve_credential_env(&state, session.project_id.as_str()).await?))
}

pub async fn session_post_credentials(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(_req): Json<PostCredentialsRequest>,
) -> ApiResult<Json<CredentialEnv>> {
    session_get_credentials(State(state), Path(session_id), headers).await
}

pub async fn session_project_binding(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ProjectBindingRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = presented_token(&headers)?;
    let session = state.agent_tools_sessions.get(&session_id).ok_or_else(|| HubError::NotFound(format!("no agent_tools session {session_id}")))?;
    require_token(&token, Some(session.token_hash.as_str()))?;
    let bound = session.project_id.as_str() == req.project_id;
    Ok(Json(serde_json::json!({"bound": bound, "project_id": session.project_id.as_str()})))
}

pub async fn session_submit_artifact(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SubmitArtifactRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = presented_token(&headers)?;
    let session = state.agent_tools_sessions.get(&session_id).ok_or_else(|| HubError::NotFound(format!("no agent_tools session {session_id}")))?;
    require_token(&token, Some(session.token_hash.as_str()))?;

    let dir = state.data_dir.join("artifacts").join("agent_tools_sessions").join(&session_id);
    std::fs::create_dir_all(&dir).map_err(HubError::from)?;
    let bytes = std::fs::read(&req.source_path).map_err(HubError::from)?;
    std::fs::write(dir.join(&req.name), &bytes).map_err(HubError::from)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
