// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-Configure Worker: clones a candidate repository, runs a one-shot
//! analysis agent over it, and turns its recommendation into a normalized
//! build recipe a project can be created from.
//!
//! Unlike the Project Build Pipeline, which drives every subprocess through
//! the request/response [`agent_hub_adapters::CommandRunner`] boundary, the
//! analysis agent here needs to be cancellable mid-run, so it is spawned
//! directly as a [`tokio::process::Child`] and polled for exit rather than
//! awaited to completion in one shot — the same SIGTERM-then-SIGKILL escalation
//! [`crate::pty_session::ChatRuntime::terminate`] uses for a chat's PTY child,
//! minus the process-group signal since this child is not its own group leader.

use crate::build_pipeline::CancelFlag;
use agent_hub_adapters::{git_env_for_credential, materialize_credential_file, resolve_for_repository, CommandRunner, SecretResolver};
use agent_hub_core::{BaseImageMode, BindingMode, CredentialRecord, HubError, HubResult};
use agent_hub_storage::{EventBus, HubEvent};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

/// How long `terminate` waits after SIGTERM before escalating to SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(4);
/// How often the run loop polls the analysis child for exit and the
/// cancellation flag for a request to stop.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(200);

fn bail_if_cancelled(cancel: &CancelFlag) -> HubResult<()> {
    if cancel.is_cancelled() {
        Err(HubError::Conflict("auto-configure analysis cancelled".to_string()))
    } else {
        Ok(())
    }
}

/// The agent's recommendation, normalized into the shape a project's
/// fingerprint-relevant fields are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecipe {
    pub base_image_mode: BaseImageMode,
    pub base_image_value: String,
    pub setup_script: String,
    pub ro_mounts: Vec<String>,
    pub rw_mounts: Vec<String>,
    pub env_vars: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct RawRecommendation {
    #[serde(default)]
    base_image_mode: Option<String>,
    #[serde(default)]
    base_image: Option<String>,
    #[serde(default)]
    setup_script: Option<String>,
    #[serde(default)]
    ro_mounts: Vec<String>,
    #[serde(default)]
    rw_mounts: Vec<String>,
    #[serde(default)]
    env_vars: Vec<String>,
}

fn analysis_prompt() -> String {
    "Inspect this repository and recommend a build recipe for running a coding agent inside a \
     container against it. Reply with a single JSON object (bare, or inside a ```json code \
     fence) with these fields: base_image_mode (\"tag\" or \"repo_path\"), base_image (a docker \
     image tag, or a path inside the repo to a Dockerfile), setup_script (a shell script run once \
     after cloning to install dependencies), ro_mounts and rw_mounts (arrays of \
     \"host_path:container_path\" strings), and env_vars (array of \"KEY=VALUE\" strings)."
        .to_string()
}

/// Parse the agent's final message: the raw object, an object inside a
/// fenced code block, or the first top-level JSON object found in the text,
/// tried in that order.
fn parse_last_message(text: &str) -> HubResult<RawRecommendation> {
    let trimmed = text.trim();

    if let Ok(v) = serde_json::from_str::<RawRecommendation>(trimmed) {
        return Ok(v);
    }
    if let Some(fenced) = extract_fenced_json(trimmed) {
        if let Ok(v) = serde_json::from_str::<RawRecommendation>(&fenced) {
            return Ok(v);
        }
    }
    if let Some(obj) = extract_first_json_object(trimmed) {
        if let Ok(v) = serde_json::from_str::<RawRecommendation>(&obj) {
            return Ok(v);
        }
    }

    Err(HubError::Upstream("analysis agent did not produce a parseable JSON recommendation".to_string()))
}

fn extract_fenced_json(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_marker = &text[start + 3..];
    let after_marker = after_marker.strip_prefix("json").unwrap_or(after_marker);
    let after_marker = after_marker.strip_prefix('\n').unwrap_or(after_marker);
    let end = after_marker.find("```")?;
    Some(after_marker[..end].trim().to_string())
}

/// Scan for the first balanced `{...}` span, respecting quoted strings so a
/// brace inside a string literal never closes the object early.
fn extract_first_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (i, c) in text.char_indices().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn dedupe_setup_script_against_dockerfile(setup_script: &str, dockerfile: &str) -> String {
    let dockerfile_lines: HashSet<&str> = dockerfile.lines().map(str::trim).collect();
    setup_script
        .lines()
        .filter(|line| !dockerfile_lines.contains(line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize(raw: RawRecommendation, existing_dockerfile: Option<&str>) -> BuildRecipe {
    let base_image_mode = raw.base_image_mode.as_deref().and_then(|m| BaseImageMode::normalize(m).ok()).unwrap_or(BaseImageMode::Tag);
    let base_image_value = raw.base_image.unwrap_or_else(|| "ubuntu:24.04".to_string());

    let mut setup_script = raw.setup_script.unwrap_or_default();
    if let Some(dockerfile) = existing_dockerfile {
        setup_script = dedupe_setup_script_against_dockerfile(&setup_script, dockerfile);
    }

    let mut rw_mounts = raw.rw_mounts;
    let ccache_signal = setup_script.contains("ccache") || existing_dockerfile.is_some_and(|d| d.contains("ccache"));
    let sccache_signal = setup_script.contains("sccache") || existing_dockerfile.is_some_and(|d| d.contains("sccache"));
    if ccache_signal && !rw_mounts.iter().any(|m| m.contains(".ccache")) {
        rw_mounts.push("~/.cache/agent-hub/ccache:/root/.ccache".to_string());
    }
    if sccache_signal && !rw_mounts.iter().any(|m| m.contains("sccache")) {
        rw_mounts.push("~/.cache/agent-hub/sccache:/root/.cache/sccache".to_string());
    }

    BuildRecipe { base_image_mode, base_image_value, setup_script, ro_mounts: raw.ro_mounts, rw_mounts, env_vars: raw.env_vars }
}

pub struct AutoConfigWorker {
    runner: Arc<dyn CommandRunner>,
    secrets: Arc<dyn SecretResolver>,
    events: EventBus,
    data_dir: PathBuf,
    cancellations: Mutex<HashMap<String, Arc<CancelFlag>>>,
    /// The analysis agent's executable. Always `codex` in production;
    /// overridable so tests can point it at a stand-in script without a
    /// real `codex` binary on the machine running them.
    analysis_program: String,
}

impl AutoConfigWorker {
    pub fn new(runner: Arc<dyn CommandRunner>, secrets: Arc<dyn SecretResolver>, events: EventBus, data_dir: PathBuf) -> Self {
        Self { runner, secrets, events, data_dir, cancellations: Mutex::new(HashMap::new()), analysis_program: "codex".to_string() }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn with_analysis_program(mut self, program: impl Into<String>) -> Self {
        self.analysis_program = program.into();
        self
    }

    /// Set the cancellation flag for a running request, identified by the
    /// same request id the client used to start it. Returns whether a
    /// matching in-flight request was found.
    pub fn request_cancel(&self, request_id: &str) -> bool {
        if let Some(flag) = self.cancellations.lock().get(request_id) {
            flag.cancel();
            true
        } else {
            false
        }
    }

    pub async fn run(&self, request_id: String, repo_url: String, binding: BindingMode, catalog: HashMap<String, CredentialRecord>) -> HubResult<BuildRecipe> {
        let cancel = Arc::new(CancelFlag::new());
        self.cancellations.lock().insert(request_id.clone(), cancel.clone());
        let result = self.run_inner(&request_id, &repo_url, &binding, &catalog, &cancel).await;
        self.cancellations.lock().remove(&request_id);
        result
    }

    fn session_dir(&self, request_id: &str) -> PathBuf {
        self.data_dir.join("tmp").join("auto_configure").join(request_id)
    }

    async fn run_inner(
        &self,
        request_id: &str,
        repo_url: &str,
        binding: &BindingMode,
        catalog: &HashMap<String, CredentialRecord>,
        cancel: &CancelFlag,
    ) -> HubResult<BuildRecipe> {
        bail_if_cancelled(cancel)?;

        let session_dir = self.session_dir(request_id);
        let workspace = session_dir.join("workspace");
        let secrets_dir = session_dir.join("credentials");
        std::fs::create_dir_all(&secrets_dir)?;

        let git_env = self.materialize_git_env(repo_url, binding, catalog, &secrets_dir).await?;

        bail_if_cancelled(cancel)?;
        self.clone_repo(&workspace, repo_url, &git_env).await?;

        bail_if_cancelled(cancel)?;
        let dockerfile = std::fs::read_to_string(workspace.join("Dockerfile")).ok();

        bail_if_cancelled(cancel)?;
        let output_path = session_dir.join("recommendation.txt");
        self.run_analysis_agent(request_id, &workspace, &output_path, cancel).await?;

        bail_if_cancelled(cancel)?;
        let raw_text = std::fs::read_to_string(&output_path).map_err(|e| HubError::Upstream(format!("analysis agent produced no output: {e}")))?;
        let raw = parse_last_message(&raw_text)?;
        Ok(normalize(raw, dockerfile.as_deref()))
    }

    async fn materialize_git_env(&self, repo_url: &str, binding: &BindingMode, catalog: &HashMap<String, CredentialRecord>, secrets_dir: &Path) -> HubResult<HashMap<String, String>> {
        let candidates = resolve_for_repository(&*self.runner, &*self.secrets, secrets_dir, repo_url, binding, catalog).await;
        let candidates = match candidates {
            Ok(c) => c,
            Err(_) => return Ok(HashMap::new()), // anonymous clone, e.g. a public repo
        };
        let Some(credential_id) = candidates.into_iter().next() else {
            return Ok(HashMap::new());
        };
        let secret = self.secrets.resolve_secret(&credential_id).await?;
        let file = materialize_credential_file(secrets_dir, &credential_id, &secret)?;
        Ok(git_env_for_credential(&file))
    }

    async fn clone_repo(&self, workspace: &Path, repo_url: &str, git_env: &HashMap<String, String>) -> HubResult<()> {
        if let Some(parent) = workspace.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = vec!["clone".to_string(), repo_url.to_string(), workspace.display().to_string()];
        let output = self.runner.run("git", &args, git_env).await.map_err(|e| HubError::Internal(format!("failed to run git clone: {e}")))?;
        if !output.status_success {
            return Err(HubError::config(format!("git clone failed: {}", output.stderr.trim())));
        }
        Ok(())
    }

    async fn run_analysis_agent(&self, request_id: &str, workspace: &Path, output_path: &Path, cancel: &CancelFlag) -> HubResult<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        bail_if_cancelled(cancel)?;

        let args = vec![
            "exec".to_string(),
            "--sandbox".to_string(),
            "read-only".to_string(),
            "--cd".to_string(),
            workspace.display().to_string(),
            "--output-last-message".to_string(),
            output_path.display().to_string(),
            analysis_prompt(),
        ];
        let mut child = tokio::process::Command::new(&self.analysis_program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HubError::Internal(format!("failed to spawn analysis agent: {e}")))?;

        let stdout = child.stdout.take().ok_or_else(|| HubError::Internal("analysis agent had no stdout".to_string()))?;
        let events = self.events.clone();
        let request_id_owned = request_id.to_string();
        tokio::spawn(async move {
            let mut lines = tokio::io::BufReader::new(stdout).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                events.publish(HubEvent::AutoConfigLog { chat_id: request_id_owned.clone(), line: text });
            }
        });

        loop {
            if let Some(status) = child.try_wait().map_err(|e| HubError::Internal(format!("failed to poll analysis agent: {e}")))? {
                return if status.success() { Ok(()) } else { Err(HubError::Upstream(format!("analysis agent exited with status {status}"))) };
            }
            if cancel.is_cancelled() {
                self.terminate(&mut child).await;
                return Err(HubError::Conflict("auto-configure analysis cancelled".to_string()));
            }
            tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
        }
    }

    async fn terminate(&self, child: &mut tokio::process::Child) {
        if let Some(pid) = child.id() {
            let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), nix::sys::signal::Signal::SIGTERM);
        }

        let deadline = tokio::time::Instant::now() + KILL_GRACE;
        loop {
            if child.try_wait().ok().flatten().is_some() {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let _ = child.start_kill();
    }
}

#[cfg(test)]
#[path = "auto_configure_tests.rs"]
mod tests;
