// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's shared, cloneable application state handed to every axum
//! handler, grounded on `hi-youichi-loom`'s `serve::app::AppState` pattern:
//! a small `Clone` struct of `Arc`-wrapped shared pieces, no interior
//! `Mutex` of its own beyond what the wrapped components already carry.

use crate::adapters::{load_github_app_settings, DockerInspector, FileOpenAiCredentialSource, FileSecretResolver};
use crate::config::HubConfig;
use crate::sessions::{AgentToolsSessionRegistry, OAuthLoginSessionRegistry};
use agent_hub_adapters::{CommandRunner, GithubAppClient, SystemCommandRunner};
use agent_hub_core::enums::ChatStatus;
use agent_hub_core::HubResult;
use agent_hub_engine::{archive_on_new_prompt, AutoConfigWorker, BuildWorker, ChatRuntimeEvent, ChatRuntimeRegistry, TitleWorker};
use agent_hub_storage::{EventBus, HubEvent, StateStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HubConfig>,
    pub store: Arc<StateStore>,
    pub events: EventBus,
    pub chats: ChatRuntimeRegistry,
    pub agent_tools_sessions: AgentToolsSessionRegistry,
    pub oauth_logins: OAuthLoginSessionRegistry,
    /// Pending GitHub App manifest setup flows: session id → state nonce.
    pub github_app_setup_states: Arc<Mutex<HashMap<String, String>>>,
    pub builds: Arc<BuildWorker>,
    pub titles: Arc<TitleWorker>,
    pub auto_configure: Arc<AutoConfigWorker>,
    pub secrets: Arc<FileSecretResolver>,
    pub openai: Arc<FileOpenAiCredentialSource>,
    pub docker: Arc<DockerInspector>,
    pub runner: Arc<dyn CommandRunner>,
    pub github_app_client: Arc<Mutex<Option<Arc<GithubAppClient>>>>,
    pub http_client: reqwest::Client,
    pub chat_events: tokio::sync::mpsc::Sender<ChatRuntimeEvent>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(config: HubConfig) -> HubResult<AppState> {
        let config = Arc::new(config);
        let data_dir = config.data_dir.clone();
        std::fs::create_dir_all(&data_dir)?;

        let store = Arc::new(StateStore::open(data_dir.join("state.json"))?);
        let events = EventBus::default();
        let chats = ChatRuntimeRegistry::default();
        let agent_tools_sessions = AgentToolsSessionRegistry::default();
        let oauth_logins = OAuthLoginSessionRegistry::default();
        let github_app_setup_states = Arc::new(Mutex::new(HashMap::new()));

        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
        let secrets = Arc::new(FileSecretResolver::new(&data_dir));
        let openai = Arc::new(FileOpenAiCredentialSource::new(&data_dir));
        let docker = Arc::new(DockerInspector::new(runner.clone()));
        let http_client = reqwest::Client::new();

        let builds = Arc::new(BuildWorker::new(runner.clone(), secrets.clone(), docker.clone(), store.clone(), events.clone(), data_dir.clone()));
        let auto_configure = Arc::new(AutoConfigWorker::new(runner.clone(), secrets.clone(), events.clone(), data_dir.clone()));
        let titles = Arc::new(TitleWorker::new(runner.clone(), http_client.clone(), openai.clone(), store.clone(), data_dir.clone()));

        let github_app_client = Arc::new(Mutex::new(load_github_app_client(&config, &data_dir)));

        let (chat_events_tx, chat_events_rx) = tokio::sync::mpsc::channel(256);
        spawn_chat_event_loop(chat_events_rx, store.clone(), chats.clone(), titles.clone(), events.clone());

        Ok(Self {
            config,
            store,
            events,
            chats,
            agent_tools_sessions,
            oauth_logins,
            github_app_setup_states,
            builds,
            titles,
            auto_configure,
            secrets,
            openai,
            docker,
            runner,
            github_app_client,
            http_client,
            chat_events: chat_events_tx,
            data_dir,
        })
    }
}

/// Build the GitHub App client from whichever source is configured:
/// explicit config (private key inline or on disk) takes priority over a
/// previously completed manifest setup flow persisted to disk.
fn load_github_app_client(config: &HubConfig, data_dir: &std::path::Path) -> Option<Arc<GithubAppClient>> {
    if let Some(cfg) = config.github_app() {
        if let Some(id) = &cfg.id {
            let pem = cfg
                .private_key
                .clone()
                .or_else(|| cfg.private_key_file.as_ref().and_then(|p| std::fs::read_to_string(p).ok()));
            if let Some(pem) = pem {
                return Some(Arc::new(GithubAppClient::new(id.clone(), pem.into_bytes())));
            }
        }
    }
    let settings = load_github_app_settings(data_dir)?;
    Some(Arc::new(GithubAppClient::new(settings.id, settings.pem.into_bytes())))
}

/// Drains chat-runtime events (a prompt was submitted, the process exited)
/// and folds them back into persisted chat state: archiving the prior
/// prompt's artifacts, triggering title generation, and recording exit
/// status. Grounded on `build_pipeline::BuildWorker`'s pattern of a worker
/// owning its own background task rather than handlers polling for state.
fn spawn_chat_event_loop(
    mut rx: tokio::sync::mpsc::Receiver<ChatRuntimeEvent>,
    store: Arc<StateStore>,
    chats: ChatRuntimeRegistry,
    titles: Arc<TitleWorker>,
    events: EventBus,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ChatRuntimeEvent::PromptSubmitted { chat_id, prompt } => {
                    let result = store.mutate(|s| {
                        if let Some(chat) = s.chats.get_mut(chat_id.as_str()) {
                            let previous = chat.title_user_prompts.last().cloned().unwrap_or_default();
                            archive_on_new_prompt(chat, &previous, chrono::Utc::now());
                            chat.title_user_prompts.push(prompt.clone());
                        }
                        Ok(())
                    });
                    if result.is_ok() {
                        titles.trigger(chat_id.clone());
                        events.publish(HubEvent::StateChanged { reason: "prompt_submitted".to_string(), at: chrono::Utc::now() });
                    }
                }
                ChatRuntimeEvent::Exited { chat_id, exit_code } => {
                    chats.remove(&chat_id);
                    let now = chrono::Utc::now();
                    let _ = store.mutate(|s| {
                        if let Some(chat) = s.chats.get_mut(chat_id.as_str()) {
                            let status = if exit_code == Some(0) { ChatStatus::Stopped } else { ChatStatus::Failed };
                            chat.transition(status, "agent process exited", now);
                            chat.pid = None;
                            chat.last_exit_code = exit_code;
                            chat.last_exit_at = Some(now);
                        }
                        Ok(())
                    });
                    events.publish(HubEvent::StateChanged { reason: "chat_exited".to_string(), at: now });
                }
            }
        }
    });
}
