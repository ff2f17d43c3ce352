// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface. Route modules mirror the resource groups in the external
//! interface: hub-level state/settings, projects, chats and their
//! artifacts, the agent-facing `agent-tools` surface, and auth connect
//! flows. Grounded on `hi-youichi-loom::serve::app`'s
//! `Router::new().route(...).with_state(state)` composition, generalized
//! from its single WS route to this surface's full resource tree.

pub mod agent_tools;
pub mod auth;
pub mod chats;
pub mod hub;
pub mod projects;

use crate::state::AppState;
use crate::ws;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/state", get(hub::get_state))
        .route("/api/settings", get(hub::get_settings).patch(hub::patch_settings))
        .route("/api/settings/auth", get(auth::get_auth_status))
        .route("/api/settings/auth/openai/connect", post(auth::openai_connect))
        .route("/api/settings/auth/openai/disconnect", post(auth::openai_disconnect))
        .route("/api/settings/auth/openai/title-test", post(auth::openai_title_test))
        .route("/api/settings/auth/openai/account/start", post(auth::openai_account_start))
        .route("/api/settings/auth/openai/account/cancel", post(auth::openai_account_cancel))
        .route("/api/settings/auth/openai/account/session", post(auth::openai_account_session))
        .route("/api/settings/auth/openai/account/callback", post(auth::openai_account_callback))
        .route("/api/settings/auth/github-app/setup/start", post(auth::github_app_setup_start))
        .route("/api/settings/auth/github-app/setup/session", post(auth::github_app_setup_session))
        .route("/api/settings/auth/github-app/setup/callback", post(auth::github_app_setup_callback))
        .route("/api/settings/auth/github-app/connect", post(auth::github_app_connect))
        .route("/api/settings/auth/github-app/disconnect", post(auth::github_app_disconnect))
        .route("/api/settings/auth/github-app/installations", post(auth::github_app_installations))
        .route("/api/settings/auth/github-tokens/connect", post(auth::github_token_connect))
        .route("/api/settings/auth/github-tokens/disconnect", post(auth::github_token_disconnect))
        .route("/api/settings/auth/github-tokens/:token_id", delete(auth::token_delete))
        .route("/api/settings/auth/gitlab-tokens/connect", post(auth::gitlab_token_connect))
        .route("/api/settings/auth/gitlab-tokens/disconnect", post(auth::gitlab_token_disconnect))
        .route("/api/settings/auth/gitlab-tokens/:token_id", delete(auth::token_delete))
        .route("/api/projects", post(projects::create_project))
        .route("/api/projects/auto-configure", post(projects::auto_configure_start))
        .route("/api/projects/auto-configure/cancel", post(projects::auto_configure_cancel))
        .route("/api/projects/:id", patch(projects::patch_project).delete(projects::delete_project))
        .route("/api/projects/:id/build/cancel", post(projects::cancel_build))
        .route("/api/projects/:id/build-logs", get(projects::build_logs))
        .route("/api/projects/:id/launch-profile", get(projects::launch_profile))
        .route("/api/projects/:id/chats/start", post(projects::start_chat))
        .route("/api/projects/:id/credential-binding", get(projects::get_credential_binding).post(projects::set_credential_binding))
        .route("/api/chats", post(chats::create_chat))
        .route("/api/chats/:id", patch(chats::patch_chat).delete(chats::delete_chat))
        .route("/api/chats/:id/start", post(chats::start_chat))
        .route("/api/chats/:id/close", post(chats::close_chat))
        .route("/api/chats/:id/refresh-container", post(chats::refresh_container))
        .route("/api/chats/:id/launch-profile", get(chats::launch_profile))
        .route("/api/chats/:id/logs", get(chats::logs))
        .route("/api/chats/:id/artifacts", get(chats::list_artifacts))
        .route("/api/chats/:id/artifacts/publish", post(chats::publish_artifact))
        .route("/api/chats/:id/artifacts/:artifact_id/download", get(chats::download_artifact))
        .route("/api/chats/:id/artifacts/:artifact_id/preview", get(chats::preview_artifact))
        .route("/api/chats/:id/agent-tools/credentials", get(agent_tools::get_credentials).post(agent_tools::post_credentials))
        .route("/api/chats/:id/agent-tools/project-binding", post(agent_tools::project_binding))
        .route("/api/chats/:id/agent-tools/ack", post(agent_tools::ack))
        .route("/api/chats/:id/agent-tools/artifacts/submit", post(agent_tools::submit_artifact))
        .route("/api/agent-tools/sessions/:session_id/credentials", get(agent_tools::session_get_credentials).post(agent_tools::session_post_credentials))
        .route("/api/agent-tools/sessions/:session_id/project-binding", post(agent_tools::session_project_binding))
        .route("/api/agent-tools/sessions/:session_id/artifacts/submit", post(agent_tools::session_submit_artifact))
        .route("/api/events", get(ws::events_ws))
        .route("/api/chats/:id/terminal", get(ws::terminal_ws));

    let mut app = Router::new().merge(api);

    if let Some(static_dir) = static_assets_dir() {
        app = app.fallback_service(ServeDir::new(static_dir));
    } else {
        app = app.route("/", get(hub::spa_fallback));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

fn static_assets_dir() -> Option<std::path::PathBuf> {
    let dir = std::path::PathBuf::from("web/dist");
    dir.is_dir().then_some(dir)
}
