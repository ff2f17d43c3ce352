// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat lifecycle: create, patch, start/stop, container refresh, logs, and
//! artifacts.

use crate::error::{ApiError, ApiResult};
use crate::routes::hub::{require_chat, require_project};
use crate::state::AppState;
use agent_hub_adapters::{resolve_identity, LaunchSpec, Mount};
use agent_hub_core::enums::{AgentType, BuildStatus, ChatStatus};
use agent_hub_core::{Chat, ChatId, HubError, Project};
use agent_hub_engine::{chat_artifact_dir, ingest};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Build a fresh [`Chat`] record for a project with rotated start tokens
/// left unset — tokens are minted at start time, not creation time.
pub fn new_chat_for_project(project: &Project, name: Option<String>, agent_type: AgentType) -> Chat {
    let now = chrono::Utc::now();
    Chat {
        id: ChatId::new(),
        project_id: project.id.clone(),
        name: name.unwrap_or_else(|| project.name.clone()),
        profile: None,
        ro_mounts: project.default_ro_mounts.clone(),
        rw_mounts: project.default_rw_mounts.clone(),
        env_vars: project.default_env_vars.clone(),
        agent_args: Vec::new(),
        agent_type,
        status: ChatStatus::Starting,
        status_reason: "created".to_string(),
        last_status_transition_at: now,
        pid: None,
        workspace: None,
        container_workspace: Some("/workspace".to_string()),
        setup_snapshot_image: project.setup_snapshot_image.clone(),
        start_error: None,
        last_exit_code: None,
        last_exit_at: None,
        stop_requested_at: None,
        title_user_prompts: Vec::new(),
        title_cached: None,
        title_prompt_fingerprint: None,
        title_status: agent_hub_core::enums::TitleStatus::Idle,
        title_error: None,
        artifacts: Vec::new(),
        artifact_current_ids: Vec::new(),
        artifact_prompt_history: Vec::new(),
        artifact_publish_token_hash: None,
        agent_tools_token_hash: None,
        ready_ack_guid: None,
        ready_ack_stage: None,
        ready_ack_at: None,
        ready_ack_meta: None,
        create_request_id: None,
        created_at: now,
        updated_at: now,
    }
}

fn parse_mount(raw: &str, read_only: bool) -> Option<Mount> {
    let (host, container) = raw.split_once(':')?;
    Some(Mount { host_path: host.to_string(), container_path: container.to_string(), read_only })
}

/// Resolve a chat's project, mint a fresh set of start tokens, compile the
/// launch argv, and hand it to [`agent_hub_engine::ChatRuntime`]. Mirrors
/// how `BuildWorker::run` drives `docker build` through the same
/// runner/identity primitives but for `docker run` instead.
pub async fn spawn_chat_runtime(state: &AppState, chat_id: ChatId) -> ApiResult<()> {
    let chat = require_chat(state, chat_id.as_str())?;
    let project = require_project(state, chat.project_id.as_str())?;

    if project.build_status != BuildStatus::Ready {
        return Err(ApiError(HubError::Unprocessable("project has no ready setup snapshot".to_string())));
    }
    let image = project.setup_snapshot_image.clone().ok_or_else(|| HubError::Unprocessable("project has no setup snapshot image".to_string()))?;

    let settings = state.store.snapshot().settings;
    let shared_root = state.config.shared_root.clone().unwrap_or_else(|| state.data_dir.clone());
    let env: HashMap<String, String> = std::env::vars().collect();
    let identity = resolve_identity(&settings, &env, &shared_root)?;

    let workspace_dir = state.data_dir.join("projects").join(project.id.as_str()).join("workspace");
    let tokens = agent_hub_engine::mint_start_tokens();

    let mut mounts: Vec<Mount> = chat.ro_mounts.iter().filter_map(|m| parse_mount(m, true)).collect();
    mounts.extend(chat.rw_mounts.iter().filter_map(|m| parse_mount(m, false)));

    let mut env_vars: Vec<(String, String)> = chat
        .env_vars
        .iter()
        .filter_map(|kv| kv.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
        .collect();
    env_vars.push(("AGENT_HUB_AGENT_TOOLS_TOKEN".to_string(), tokens.agent_tools.plaintext.clone()));
    env_vars.push(("AGENT_HUB_AGENT_TOOLS_CHAT_ID".to_string(), chat.id.as_str().to_string()));
    env_vars.push(("AGENT_HUB_AGENT_TOOLS_PROJECT_ID".to_string(), project.id.as_str().to_string()));
    env_vars.push(("AGENT_HUB_READY_ACK_GUID".to_string(), tokens.ready_ack_guid.clone()));
    if let Some(url) = &state.config.agent_tools_url {
        env_vars.push(("AGENT_HUB_AGENT_TOOLS_URL".to_string(), url.clone()));
    }

    let agent_binary = match chat.agent_type {
        AgentType::Codex => "codex",
        AgentType::Claude => "claude",
        AgentType::Gemini => "gemini",
    };
    let mut agent_command = vec![agent_binary.to_string()];
    agent_command.extend(chat.agent_args.clone());

    let spec = LaunchSpec {
        container_name: format!("agent-hub-chat-{}", chat.id.as_str()),
        image,
        identity,
        mounts,
        env_vars,
        workdir: chat.container_workspace.clone().unwrap_or_else(|| "/workspace".to_string()),
        agent_command,
    };
    let argv = agent_hub_adapters::compile_launch_argv(&spec);
    let mut full_argv = vec!["docker".to_string()];
    full_argv.extend(argv);

    let log_path = state.data_dir.join("logs").join("chats").join(format!("{}.log", chat.id.as_str()));
    let runtime = agent_hub_engine::ChatRuntime::spawn(chat.id.clone(), &full_argv, log_path, state.chat_events.clone())?;
    let pid = runtime.pid;
    state.chats.insert(&chat.id, runtime);

    let now = chrono::Utc::now();
    state.store.mutate(|s| {
        if let Some(chat) = s.chats.get_mut(chat_id.as_str()) {
            chat.transition(ChatStatus::Running, "agent process started", now);
            chat.pid = pid;
            chat.workspace = Some(workspace_dir.display().to_string());
            chat.start_error = None;
            chat.agent_tools_token_hash = Some(agent_hub_engine::hash_token(&tokens.agent_tools.plaintext));
            chat.artifact_publish_token_hash = Some(agent_hub_engine::hash_token(&tokens.artifact_publish.plaintext));
            chat.ready_ack_guid = Some(tokens.ready_ack_guid.clone());
            chat.ready_ack_stage = None;
            chat.ready_ack_at = None;
            chat.stop_requested_at = None;
        }
        Ok(())
    })?;

    state
        .events
        .publish(agent_hub_storage::HubEvent::StateChanged { reason: "chat_started".to_string(), at: now });
    Ok(())
}

#[derive(Deserialize)]
pub struct CreateChatRequest {
    pub project_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub agent_type: Option<AgentType>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub ro_mounts: Option<Vec<String>>,
    #[serde(default)]
    pub rw_mounts: Option<Vec<String>>,
    #[serde(default)]
    pub env_vars: Option<Vec<String>>,
    #[serde(default)]
    pub agent_args: Option<Vec<String>>,
}

pub async fn create_chat(State(state): State<AppState>, Json(req): Json<CreateChatRequest>) -> ApiResult<Json<Chat>> {
    let project = require_project(&state, &req.project_id)?;
    let mut chat = new_chat_for_project(&project, req.name, req.agent_type.unwrap_or(AgentType::Codex));
    chat.profile = req.profile;
    if let Some(v) = req.ro_mounts {
        chat.ro_mounts = v;
    }
    if let Some(v) = req.rw_mounts {
        chat.rw_mounts = v;
    }
    if let Some(v) = req.env_vars {
        chat.env_vars = v;
    }
    if let Some(v) = req.agent_args {
        chat.agent_args = v;
    }

    state.store.mutate(|s| {
        s.chats.insert(chat.id.as_str().to_string(), chat.clone());
        Ok(())
    })?;

    state
        .events
        .publish(agent_hub_storage::HubEvent::StateChanged { reason: "chat_created".to_string(), at: chrono::Utc::now() });
    Ok(Json(chat))
}

#[derive(Deserialize, Default)]
pub struct ChatPatchRequest {
    pub name: Option<String>,
    pub profile: Option<Option<String>>,
    pub ro_mounts: Option<Vec<String>>,
    pub rw_mounts: Option<Vec<String>>,
    pub env_vars: Option<Vec<String>>,
    pub agent_args: Option<Vec<String>>,
}

pub async fn patch_chat(State(state): State<AppState>, Path(id): Path<String>, Json(patch): Json<ChatPatchRequest>) -> ApiResult<Json<Chat>> {
    let updated = state.store.mutate(|s| {
        let chat = s.chats.get_mut(&id).ok_or_else(|| HubError::NotFound(format!("no chat {id}")))?;
        if let Some(name) = patch.name {
            chat.name = name;
        }
        if let Some(profile) = patch.profile {
            chat.profile = profile;
        }
        if let Some(v) = patch.ro_mounts {
            chat.ro_mounts = v;
        }
        if let Some(v) = patch.rw_mounts {
            chat.rw_mounts = v;
        }
        if let Some(v) = patch.env_vars {
            chat.env_vars = v;
        }
        if let Some(v) = patch.agent_args {
            chat.agent_args = v;
        }
        chat.updated_at = chrono::Utc::now();
        Ok(chat.clone())
    })?;
    state
        .events
        .publish(agent_hub_storage::HubEvent::StateChanged { reason: "chat_updated".to_string(), at: chrono::Utc::now() });
    Ok(Json(updated))
}

pub async fn delete_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    let chat_id = ChatId::from_string(&id);
    if let Some(runtime) = state.chats.remove(&chat_id) {
        runtime.terminate();
    }
    state.store.mutate(|s| {
        s.chats.remove(&id).ok_or_else(|| HubError::NotFound(format!("no chat {id}")))?;
        Ok(())
    })?;

    let dir = chat_artifact_dir(&state.data_dir, &id);
    if dir.exists() {
        let _ = std::fs::remove_dir_all(dir);
    }
    state
        .events
        .publish(agent_hub_storage::HubEvent::StateChanged { reason: "chat_deleted".to_string(), at: chrono::Utc::now() });
    Ok(Json(serde_json::json!({"ok": true})))
}

pub async fn start_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Chat>> {
    spawn_chat_runtime(&state, ChatId::from_string(&id)).await?;
    Ok(Json(require_chat(&state, &id)?))
}

pub async fn close_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Chat>> {
    let chat_id = ChatId::from_string(&id);
    if let Some(runtime) = state.chats.get(&chat_id) {
        let now = chrono::Utc::now();
        state.store.mutate(|s| {
            if let Some(chat) = s.chats.get_mut(&id) {
                chat.stop_requested_at = Some(now);
            }
            Ok(())
        })?;
        runtime.terminate();
        state
            .events
            .publish(agent_hub_storage::HubEvent::StateChanged { reason: "chat_close_requested".to_string(), at: now });
    }
    Ok(Json(require_chat(&state, &id)?))
}

pub async fn refresh_container(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Chat>> {
    let chat_id = ChatId::from_string(&id);
    if let Some(runtime) = state.chats.remove(&chat_id) {
        runtime.terminate();
    }
    spawn_chat_runtime(&state, chat_id).await?;
    Ok(Json(require_chat(&state, &id)?))
}

#[derive(Serialize)]
pub struct ChatLaunchProfile {
    status: ChatStatus,
    pid: Option<u32>,
    setup_snapshot_image: Option<String>,
    container_workspace: Option<String>,
}

pub async fn launch_profile(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ChatLaunchProfile>> {
    let chat = require_chat(&state, &id)?;
    Ok(Json(ChatLaunchProfile {
        status: chat.status,
        pid: chat.pid,
        setup_snapshot_image: chat.setup_snapshot_image,
        container_workspace: chat.container_workspace,
    }))
}

pub async fn logs(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<String> {
    require_chat(&state, &id)?;
    let path = state.data_dir.join("logs").join("chats").join(format!("{id}.log"));
    Ok(std::fs::read_to_string(path).unwrap_or_default())
}

pub async fn list_artifacts(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<agent_hub_core::Artifact>>> {
    let chat = require_chat(&state, &id)?;
    Ok(Json(chat.artifacts))
}

#[derive(Deserialize)]
pub struct PublishArtifactRequest {
    pub source_path: String,
    pub name: String,
}

pub async fn publish_artifact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PublishArtifactRequest>,
) -> ApiResult<Json<agent_hub_core::Artifact>> {
    let artifact = state.store.mutate(|s| {
        let chat = s.chats.get_mut(&id).ok_or_else(|| HubError::NotFound(format!("no chat {id}")))?;
        let source = std::path::Path::new(&req.source_path);
        ingest(chat, &state.data_dir, source, &req.name, chrono::Utc::now()).map_err(HubError::from)
    })?;

    state
        .events
        .publish(agent_hub_storage::HubEvent::StateChanged { reason: "artifact_published".to_string(), at: chrono::Utc::now() });
    Ok(Json(artifact))
}

fn find_artifact(chat: &Chat, artifact_id: &str) -> ApiResult<agent_hub_core::Artifact> {
    chat.artifacts
        .iter()
        .find(|a| a.id == artifact_id)
        .cloned()
        .ok_or_else(|| ApiError(HubError::NotFound(format!("no artifact {artifact_id}"))))
}

pub async fn download_artifact(State(state): State<AppState>, Path((id, artifact_id)): Path<(String, String)>) -> ApiResult<Response> {
    let chat = require_chat(&state, &id)?;
    let artifact = find_artifact(&chat, &artifact_id)?;
    let path = chat_artifact_dir(&state.data_dir, &id).join(artifact.id.as_str()).join(&artifact.name);
    let bytes = std::fs::read(&path).map_err(HubError::from)?;
    Ok((
        [(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", artifact.name)), (header::CONTENT_TYPE, "application/octet-stream".to_string())],
        Body::from(bytes),
    )
        .into_response())
}

pub async fn preview_artifact(State(state): State<AppState>, Path((id, artifact_id)): Path<(String, String)>) -> ApiResult<Response> {
    let chat = require_chat(&state, &id)?;
    let artifact = find_artifact(&chat, &artifact_id)?;
    let path = chat_artifact_dir(&state.data_dir, &id).join(artifact.id.as_str()).join(&artifact.name);
    let bytes = std::fs::read(&path).map_err(HubError::from)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string())], Body::from(bytes)).into_response())
}
