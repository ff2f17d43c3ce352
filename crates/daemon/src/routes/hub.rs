// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub-level derived state and settings.

use crate::error::ApiResult;
use crate::state::AppState;
use agent_hub_core::{HubError, Settings, SettingsPatch};
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
pub struct StateView {
    projects: HashMap<String, agent_hub_core::Project>,
    chats: HashMap<String, agent_hub_core::Chat>,
    settings: Settings,
}

pub async fn get_state(State(state): State<AppState>) -> Json<StateView> {
    let snapshot = state.store.snapshot();
    Json(StateView { projects: snapshot.projects, chats: snapshot.chats, settings: snapshot.settings })
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.store.snapshot().settings)
}

pub async fn patch_settings(State(state): State<AppState>, Json(patch): Json<SettingsPatch>) -> ApiResult<Json<Settings>> {
    let updated = state.store.mutate(|s| {
        let now = chrono::Utc::now();
        s.settings.apply_patch(patch, now);
        s.settings.validate_identity()?;
        Ok(s.settings.clone())
    })?;

    state.events.publish(agent_hub_storage::HubEvent::StateChanged { reason: "settings_updated".to_string(), at: chrono::Utc::now() });
    Ok(Json(updated))
}

pub async fn spa_fallback() -> Html<&'static str> {
    Html("<!doctype html><html><body><p>agent-hub is running. The web frontend has not been built into web/dist.</p></body></html>")
}

/// Shared helper for route modules: look up a project or return `NOT_FOUND`.
pub fn require_project(state: &AppState, id: &str) -> Result<agent_hub_core::Project, HubError> {
    state.store.snapshot().projects.get(id).cloned().ok_or_else(|| HubError::NotFound(format!("no project {id}")))
}

/// Shared helper for route modules: look up a chat or return `NOT_FOUND`.
pub fn require_chat(state: &AppState, id: &str) -> Result<agent_hub_core::Chat, HubError> {
    state.store.snapshot().chats.get(id).cloned().ok_or_else(|| HubError::NotFound(format!("no chat {id}")))
}
