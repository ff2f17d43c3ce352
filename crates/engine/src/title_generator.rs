// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Title Generator: per-chat background title generation driven by the
//! chat's submitted-prompt history, with single-flight + pending-rerun
//! semantics (grounded on the same "is a job already running for this key"
//! check [`crate::build_pipeline::BuildWorker`] uses, generalized here to
//! also remember a pending rerun rather than simply declining).

use agent_hub_adapters::CommandRunner;
use agent_hub_core::{ChatId, HubError, HubResult, TitleStatus};
use agent_hub_storage::StateStore;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used by the API-key backend. Fixed rather than configurable: the
/// title generator is a small, latency-sensitive call, not a user-facing
/// model choice.
const MODEL: &str = "gpt-4.1-mini";
const MAX_TITLE_CHARS: usize = 80;
const MAX_TOKENS: u32 = 32;

const NO_CREDENTIALS_MESSAGE: &str = "No OpenAI credentials are configured; connect an account or set an API key to enable title generation.";

/// The two ways the hub can be authorized to call OpenAI on the user's
/// behalf, resolved once per generation pass rather than cached on the
/// worker, since either can be connected or disconnected at any time.
pub enum OpenAiCredentials {
    ApiKey(String),
    Account { codex_home: PathBuf },
}

/// Resolves which OpenAI credential (if any) is currently configured.
/// Kept as an injected seam so the title generator never hard-codes where
/// an API key or an account login session lives.
pub trait OpenAiCredentialSource: Send + Sync {
    fn resolve(&self) -> Option<OpenAiCredentials>;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Running,
    RunningWithPendingRerun,
}

/// Normalize a chat's submitted-prompt history into the exact input the
/// fingerprint and the rendered request are built from: trimmed, empty
/// entries dropped, and duplicates collapsed while preserving first-seen
/// order.
fn normalize_prompts(prompts: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for prompt in prompts {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

fn title_fingerprint(model: &str, max_chars: usize, prompts: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update(b"|");
    hasher.update(max_chars.to_le_bytes());
    for prompt in prompts {
        hasher.update(b"|");
        hasher.update(prompt.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn system_prompt() -> &'static str {
    "You write short, specific titles for coding-agent chat sessions. \
     Respond with the title text only: no surrounding quotes, no trailing punctuation, no preamble."
}

fn user_prompt(prompts: &[String]) -> String {
    format!(
        "Summarize the intent of this conversation in a title of at most {MAX_TITLE_CHARS} characters, \
         based on the user's messages below, oldest first:\n\n{}",
        prompts.join("\n---\n")
    )
}

fn truncate_title(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.chars().count() <= MAX_TITLE_CHARS {
        trimmed.to_string()
    } else {
        trimmed.chars().take(MAX_TITLE_CHARS).collect()
    }
}

pub struct TitleWorker {
    runner: Arc<dyn CommandRunner>,
    http: reqwest::Client,
    credentials: Arc<dyn OpenAiCredentialSource>,
    store: Arc<StateStore>,
    data_dir: PathBuf,
    slots: Mutex<HashMap<String, SlotState>>,
}

impl TitleWorker {
    pub fn new(runner: Arc<dyn CommandRunner>, http: reqwest::Client, credentials: Arc<dyn OpenAiCredentialSource>, store: Arc<StateStore>, data_dir: PathBuf) -> Self {
        Self { runner, http, credentials, store, data_dir, slots: Mutex::new(HashMap::new()) }
    }

    /// Trigger a generation pass for `chat_id`. If one is already running,
    /// this sets a pending-rerun flag instead of starting a second pass;
    /// the running pass reruns itself once before releasing the slot.
    pub fn trigger(self: &Arc<Self>, chat_id: ChatId) {
        let mut slots = self.slots.lock();
        match slots.get_mut(chat_id.as_str()) {
            Some(slot) => {
                *slot = SlotState::RunningWithPendingRerun;
                return;
            }
            None => {
                slots.insert(chat_id.as_str().to_string(), SlotState::Running);
            }
        }
        drop(slots);

        let worker = self.clone();
        tokio::spawn(async move { worker.run_loop(chat_id).await });
    }

    async fn run_loop(&self, chat_id: ChatId) {
        loop {
            if let Err(e) = self.run_once(&chat_id).await {
                tracing::warn!(chat_id = %chat_id, error = %e, "title generation pass failed");
            }

            let mut slots = self.slots.lock();
            match slots.get(chat_id.as_str()) {
                Some(SlotState::RunningWithPendingRerun) => {
                    slots.insert(chat_id.as_str().to_string(), SlotState::Running);
                }
                _ => {
                    slots.remove(chat_id.as_str());
                    return;
                }
            }
        }
    }

    async fn run_once(&self, chat_id: &ChatId) -> HubResult<()> {
        let Some(chat) = self.store.snapshot().chats.get(chat_id.as_str()).cloned() else { return Ok(()) };

        let prompts = normalize_prompts(&chat.title_user_prompts);
        if prompts.is_empty() {
            return Ok(());
        }

        let fingerprint = title_fingerprint(MODEL, MAX_TITLE_CHARS, &prompts);
        if chat.title_prompt_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return Ok(());
        }

        let Some(credentials) = self.credentials.resolve() else {
            return self.store.mutate(|state| {
                if let Some(c) = state.chats.get_mut(chat_id.as_str()) {
                    c.title_status = TitleStatus::Error;
                    c.title_error = Some(NO_CREDENTIALS_MESSAGE.to_string());
                }
                Ok(())
            });
        };

        self.store.mutate(|state| {
            if let Some(c) = state.chats.get_mut(chat_id.as_str()) {
                c.title_status = TitleStatus::Pending;
            }
            Ok(())
        })?;

        let outcome = match credentials {
            OpenAiCredentials::ApiKey(key) => self.generate_via_api_key(&key, &prompts).await,
            OpenAiCredentials::Account { codex_home } => self.generate_via_codex_cli(chat_id, &codex_home, &prompts).await,
        };

        self.store.mutate(|state| {
            let Some(c) = state.chats.get_mut(chat_id.as_str()) else { return Ok(()) };
            match &outcome {
                Ok(title) => {
                    c.title_cached = Some(title.clone());
                    c.title_prompt_fingerprint = Some(fingerprint.clone());
                    c.title_status = TitleStatus::Ready;
                    c.title_error = None;
                }
                Err(e) => {
                    c.title_status = TitleStatus::Error;
                    c.title_error = Some(e.to_string());
                }
            }
            Ok(())
        })?;

        outcome.map(|_| ())
    }

    async fn generate_via_api_key(&self, api_key: &str, prompts: &[String]) -> HubResult<String> {
        #[derive(serde::Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: String,
        }

        #[derive(serde::Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            max_tokens: u32,
        }

        #[derive(serde::Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(serde::Deserialize)]
        struct ChoiceMessage {
            content: String,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        let body = Request {
            model: MODEL,
            messages: vec![
                Message { role: "system", content: system_prompt().to_string() },
                Message { role: "user", content: user_prompt(prompts) },
            ],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| HubError::Upstream(format!("OpenAI chat-completions request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(HubError::Upstream(format!("OpenAI chat-completions returned {status}: {text}")));
        }

        let parsed: Response = response.json().await.map_err(|e| HubError::Upstream(format!("invalid OpenAI response: {e}")))?;
        let raw = parsed.choices.first().map(|c| c.message.content.clone()).ok_or_else(|| HubError::Upstream("OpenAI response had no choices".to_string()))?;
        Ok(truncate_title(&raw))
    }

    async fn generate_via_codex_cli(&self, chat_id: &ChatId, codex_home: &std::path::Path, prompts: &[String]) -> HubResult<String> {
        let output_path = self.data_dir.join("tmp").join(format!("title-{}.txt", chat_id.as_str()));
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let _ = std::fs::remove_file(&output_path);

        let mut env = HashMap::new();
        env.insert("CODEX_HOME".to_string(), codex_home.display().to_string());

        let args = vec![
            "exec".to_string(),
            "--sandbox".to_string(),
            "read-only".to_string(),
            "--output-last-message".to_string(),
            output_path.display().to_string(),
            user_prompt(prompts),
        ];

        let output = self.runner.run("codex", &args, &env).await.map_err(|e| HubError::Internal(format!("failed to run codex exec: {e}")))?;
        if !output.status_success {
            return Err(HubError::Upstream(format!("codex exec exited with status {}: {}", output.status_code, output.stderr.trim())));
        }

        let raw = std::fs::read_to_string(&output_path).map_err(|e| HubError::Upstream(format!("codex exec produced no output-last-message file: {e}")))?;
        let _ = std::fs::remove_file(&output_path);
        Ok(truncate_title(&raw))
    }
}

#[cfg(test)]
#[path = "title_generator_tests.rs"]
mod tests;
