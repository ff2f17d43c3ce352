// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point: load configuration, build [`AppState`], reconcile stored
//! chat state against the containers Docker actually reports, then serve
//! the HTTP/WS surface until a shutdown signal arrives.

mod adapters;
mod config;
mod error;
mod routes;
mod sessions;
mod state;
mod ws;

use agent_hub_engine::SystemProcessProbe;
use state::AppState;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load()?;
    let data_dir = config.data_dir.clone();
    std::fs::create_dir_all(&data_dir)?;

    let _log_guard = init_tracing(&data_dir);

    let state = AppState::new(config)?;

    let report = agent_hub_engine::reconcile(&state.store, state.docker.as_ref(), &SystemProcessProbe, &state.data_dir).await?;
    tracing::info!(
        chats_transitioned = report.chats_transitioned,
        containers_removed = report.containers_removed,
        "reconciled chat state against docker on startup"
    );

    let bind_addr = state.config.bind_addr.clone();
    let chats = state.chats.clone();
    let router = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "agent-hubd listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    chats.terminate_all();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Env-filter driven tracing (`RUST_LOG`, default `info`), rolling daily
/// log file under `<data_dir>/logs/`.
fn init_tracing(data_dir: &PathBuf) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = data_dir.join("logs");
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(log_dir, "hub.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(non_blocking).init();

    guard
}
