// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project CRUD, build control, and the auto-configure analysis flow.

use crate::error::{ApiError, ApiResult};
use crate::routes::hub::require_project;
use crate::state::AppState;
use agent_hub_core::enums::{BaseImageMode, BindingMode};
use agent_hub_core::{HubError, Project, ProjectId, ProjectPatch};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub repo_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default = "default_setup_script")]
    pub setup_script: String,
    #[serde(default = "BaseImageMode::tag_default")]
    pub base_image_mode: BaseImageMode,
    pub base_image_value: String,
    #[serde(default)]
    pub default_ro_mounts: Vec<String>,
    #[serde(default)]
    pub default_rw_mounts: Vec<String>,
    #[serde(default)]
    pub default_env_vars: Vec<String>,
    #[serde(default = "BindingMode::default_auto")]
    pub credential_binding: BindingMode,
}

fn default_setup_script() -> String {
    "true".to_string()
}

impl BaseImageMode {
    pub fn tag_default() -> Self {
        BaseImageMode::Tag
    }
}

pub async fn create_project(State(state): State<AppState>, Json(req): Json<CreateProjectRequest>) -> ApiResult<Json<Project>> {
    let now = chrono::Utc::now();
    let project = Project {
        id: ProjectId::new(),
        name: req.name,
        repo_url: req.repo_url,
        default_branch: req.default_branch,
        setup_script: req.setup_script,
        base_image_mode: req.base_image_mode,
        base_image_value: req.base_image_value,
        default_ro_mounts: req.default_ro_mounts,
        default_rw_mounts: req.default_rw_mounts,
        default_env_vars: req.default_env_vars,
        credential_binding: req.credential_binding,
        repo_head_sha: None,
        setup_snapshot_image: None,
        build_status: agent_hub_core::enums::BuildStatus::Pending,
        build_error: None,
        build_started_at: None,
        build_finished_at: None,
        created_at: now,
        updated_at: now,
    };

    state.store.mutate(|s| {
        if s.project_by_name(&project.name).is_some() {
            return Err(HubError::Conflict(format!("a project named {:?} already exists", project.name)));
        }
        s.projects.insert(project.id.as_str().to_string(), project.clone());
        Ok(())
    })?;

    let worker = state.builds.clone();
    let id = project.id.clone();
    tokio::spawn(async move { worker.run(id).await });

    state.events.publish(agent_hub_storage::HubEvent::StateChanged { reason: "project_created".to_string(), at: chrono::Utc::now() });
    Ok(Json(project))
}

pub async fn patch_project(State(state): State<AppState>, Path(id): Path<String>, Json(patch): Json<ProjectPatch>) -> ApiResult<Json<Project>> {
    let updated = state.store.mutate(|s| {
        let project = s.projects.get_mut(&id).ok_or_else(|| HubError::NotFound(format!("no project {id}")))?;
        project.apply_patch(patch, chrono::Utc::now());
        Ok(project.clone())
    })?;

    if updated.build_status == agent_hub_core::enums::BuildStatus::Pending {
        let worker = state.builds.clone();
        let project_id = updated.id.clone();
        tokio::spawn(async move { worker.run(project_id).await });
    }

    state.events.publish(agent_hub_storage::HubEvent::StateChanged { reason: "project_updated".to_string(), at: chrono::Utc::now() });
    Ok(Json(updated))
}

pub async fn delete_project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    state.store.mutate(|s| {
        if s.chats_for_project(&ProjectId::from_string(&id)).next().is_some() {
            return Err(HubError::Conflict("project has chats that must be removed first".to_string()));
        }
        s.projects.remove(&id).ok_or_else(|| HubError::NotFound(format!("no project {id}")))?;
        Ok(())
    })?;
    state.events.publish(agent_hub_storage::HubEvent::StateChanged { reason: "project_deleted".to_string(), at: chrono::Utc::now() });
    Ok(Json(serde_json::json!({"ok": true})))
}

pub async fn cancel_build(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    require_project(&state, &id)?;
    let cancelled = state.builds.request_cancel(&ProjectId::from_string(&id));
    Ok(Json(serde_json::json!({"cancelled": cancelled})))
}

pub async fn build_logs(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<String> {
    require_project(&state, &id)?;
    let path = state.data_dir.join("logs").join("projects").join(format!("{id}.log"));
    Ok(std::fs::read_to_string(path).unwrap_or_default())
}

#[derive(Serialize)]
pub struct LaunchProfile {
    ready: bool,
    setup_snapshot_image: Option<String>,
    build_status: agent_hub_core::enums::BuildStatus,
}

pub async fn launch_profile(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<LaunchProfile>> {
    let project = require_project(&state, &id)?;
    Ok(Json(LaunchProfile {
        ready: project.build_status == agent_hub_core::enums::BuildStatus::Ready,
        setup_snapshot_image: project.setup_snapshot_image,
        build_status: project.build_status,
    }))
}

#[derive(Deserialize)]
pub struct StartChatFromProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub agent_type: Option<agent_hub_core::enums::AgentType>,
}

pub async fn start_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StartChatFromProjectRequest>,
) -> ApiResult<Json<agent_hub_core::Chat>> {
    let project = require_project(&state, &id)?;
    if project.build_status != agent_hub_core::enums::BuildStatus::Ready {
        return Err(ApiError(HubError::Unprocessable("project has no ready setup snapshot to launch from".to_string())));
    }

    let chat = super::chats::new_chat_for_project(&project, req.name, req.agent_type.unwrap_or(agent_hub_core::enums::AgentType::Codex));
    state.store.mutate(|s| {
        s.chats.insert(chat.id.as_str().to_string(), chat.clone());
        Ok(())
    })?;

    super::chats::spawn_chat_runtime(&state, chat.id.clone()).await?;
    Ok(Json(chat))
}

pub async fn get_credential_binding(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<BindingMode>> {
    let project = require_project(&state, &id)?;
    Ok(Json(project.credential_binding))
}

pub async fn set_credential_binding(State(state): State<AppState>, Path(id): Path<String>, Json(binding): Json<BindingMode>) -> ApiResult<Json<BindingMode>> {
    let updated = state.store.mutate(|s| {
        let project = s.projects.get_mut(&id).ok_or_else(|| HubError::NotFound(format!("no project {id}")))?;
        project.credential_binding = binding;
        project.updated_at = chrono::Utc::now();
        Ok(project.credential_binding.clone())
    })?;
    state.events.publish(agent_hub_storage::HubEvent::StateChanged { reason: "project_credential_binding_updated".to_string(), at: chrono::Utc::now() });
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct AutoConfigureRequest {
    pub repo_url: String,
    #[serde(default = "BindingMode::default_auto")]
    pub credential_binding: BindingMode,
}

pub async fn auto_configure_start(State(state): State<AppState>, Json(req): Json<AutoConfigureRequest>) -> ApiResult<Json<serde_json::Value>> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let worker = state.auto_configure.clone();
    let catalog = state.store.snapshot().credentials;
    let id = request_id.clone();

    tokio::spawn(async move {
        if let Err(e) = worker.run(id.clone(), req.repo_url, req.credential_binding, catalog).await {
            tracing::warn!(request_id = %id, error = %e, "auto-configure analysis failed");
        }
    });

    Ok(Json(serde_json::json!({"request_id": request_id})))
}

pub async fn auto_configure_cancel(State(state): State<AppState>, Json(body): Json<serde_json::Value>) -> ApiResult<Json<serde_json::Value>> {
    let request_id = body.get("request_id").and_then(|v| v.as_str()).ok_or_else(|| HubError::BadRequest("missing request_id".to_string()))?;
    let cancelled = state.auto_configure.request_cancel(request_id);
    Ok(Json(serde_json::json!({"cancelled": cancelled})))
}
