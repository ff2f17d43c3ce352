// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket surface: the hub-wide event stream and per-chat terminals.
//! Grounded on `hi-youichi-loom::serve::app`'s
//! `WebSocketUpgrade`/`on_upgrade` handshake, generalized from its single
//! request/response socket to an event-polling stream and a raw
//! bidirectional PTY bridge.

use crate::routes::hub::require_chat;
use crate::state::AppState;
use agent_hub_core::ChatId;
use agent_hub_storage::HubEvent;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use serde::Deserialize;
use std::time::Duration;

/// How often a socket polls its [`agent_hub_storage::Subscription`] /
/// [`agent_hub_engine::OutputSubscription`] for newly queued items.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub async fn events_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_events_socket(socket, state))
}

async fn handle_events_socket(mut socket: WebSocket, state: AppState) {
    let subscription = state.events.subscribe();

    let snapshot = HubEvent::Snapshot { at: chrono::Utc::now() };
    if send_event(&mut socket, &snapshot).await.is_err() {
        return;
    }

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let (events, lagged) = subscription.drain();
                if lagged {
                    if send_event(&mut socket, &HubEvent::Snapshot { at: chrono::Utc::now() }).await.is_err() {
                        return;
                    }
                }
                for event in events {
                    if send_event(&mut socket, &event).await.is_err() {
                        return;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &HubEvent) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text)).await
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TerminalClientMessage {
    Input { data: String },
    Resize { cols: u16, rows: u16 },
    Submit { data: String },
}

pub async fn terminal_ws(ws: WebSocketUpgrade, State(state): State<AppState>, Path(id): Path<String>) -> Response {
    ws.on_upgrade(move |socket| handle_terminal_socket(socket, state, id))
}

async fn handle_terminal_socket(mut socket: WebSocket, state: AppState, id: String) {
    if require_chat(&state, &id).is_err() {
        let _ = socket.send(Message::Text(r#"{"error":"no such chat"}"#.to_string())).await;
        let _ = socket.close().await;
        return;
    }

    let chat_id = ChatId::from_string(&id);
    let Some(runtime) = state.chats.get(&chat_id) else {
        let _ = socket.send(Message::Text(r#"{"error":"chat has no running process"}"#.to_string())).await;
        let _ = socket.close().await;
        return;
    };

    let (backlog, subscription) = runtime.output.subscribe();
    if !backlog.is_empty() && socket.send(Message::Binary(backlog)).await.is_err() {
        return;
    }

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let (chunks, _lagged) = subscription.drain();
                for chunk in chunks {
                    if socket.send(Message::Binary(chunk)).await.is_err() {
                        return;
                    }
                }
                if state.chats.get(&chat_id).is_none() {
                    let _ = socket.close().await;
                    return;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(msg) = serde_json::from_str::<TerminalClientMessage>(&text) {
                            if apply_client_message(&runtime, msg).await.is_err() {
                                return;
                            }
                        } else {
                            match runtime.write_input(text.as_bytes()) {
                                Ok(prompts) => runtime.notify_prompts_submitted(prompts).await,
                                Err(_) => return,
                            }
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        match runtime.write_input(&bytes) {
                            Ok(prompts) => runtime.notify_prompts_submitted(prompts).await,
                            Err(_) => return,
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
        }
    }
}

async fn apply_client_message(runtime: &agent_hub_engine::ChatRuntime, msg: TerminalClientMessage) -> std::io::Result<()> {
    match msg {
        TerminalClientMessage::Input { data } | TerminalClientMessage::Submit { data } => {
            let prompts = runtime.write_input(data.as_bytes())?;
            runtime.notify_prompts_submitted(prompts).await;
        }
        TerminalClientMessage::Resize { cols, rows } => {
            let _ = runtime.resize(cols, rows);
        }
    }
    Ok(())
}
