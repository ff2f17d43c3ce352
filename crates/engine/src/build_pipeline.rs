// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project Build Pipeline: clones or syncs a project's workspace, builds
//! its setup snapshot image, and streams the build log to the event bus.
//!
//! The snapshot build runs through [`agent_hub_adapters::CommandRunner`],
//! the same request/response adapter the credential broker probes with.
//! That trait hands back one [`agent_hub_adapters::CommandOutput`] per
//! call rather than an incremental stream, so build output is captured in
//! full and published as a single `project_build_log` event per command
//! instead of truly incremental chunks; cancellation is likewise checked
//! only between steps, since this layer never holds a live child handle to
//! signal mid-command. The PTY-attached chat runtime, which does hold that
//! handle, still does real SIGTERM/SIGKILL process-group cancellation.

use agent_hub_adapters::{git_env_for_credential, materialize_credential_file, resolve_for_repository, CommandRunner, SecretResolver};
use agent_hub_core::enums::{BaseImageMode, BuildStatus};
use agent_hub_core::{setup_snapshot_tag, HubError, HubResult, Project, ProjectId};
use agent_hub_storage::{EventBus, HubEvent, StateStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Checks whether an image tag already exists in the container runtime, so
/// the pipeline can skip a build that would produce a byte-identical image.
#[async_trait]
pub trait ImageInspector: Send + Sync {
    async fn image_exists(&self, tag: &str) -> HubResult<bool>;
}

#[derive(Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn bail_if_cancelled(cancel: &CancelFlag) -> HubResult<()> {
    if cancel.is_cancelled() {
        Err(HubError::Conflict("build cancelled".to_string()))
    } else {
        Ok(())
    }
}

pub struct BuildWorker {
    runner: Arc<dyn CommandRunner>,
    secrets: Arc<dyn SecretResolver>,
    images: Arc<dyn ImageInspector>,
    store: Arc<StateStore>,
    events: EventBus,
    data_dir: PathBuf,
    in_flight: Mutex<HashMap<String, Arc<CancelFlag>>>,
}

impl BuildWorker {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        secrets: Arc<dyn SecretResolver>,
        images: Arc<dyn ImageInspector>,
        store: Arc<StateStore>,
        events: EventBus,
        data_dir: PathBuf,
    ) -> Self {
        Self { runner, secrets, images, store, events, data_dir, in_flight: Mutex::new(HashMap::new()) }
    }

    fn workspace_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.data_dir.join("projects").join(project_id.as_str()).join("workspace")
    }

    fn build_log_path(&self, project_id: &ProjectId) -> PathBuf {
        self.data_dir.join("logs").join("projects").join(format!("{}.log", project_id.as_str()))
    }

    /// Set a project's cancellation flag if a build is currently in flight
    /// for it. Returns whether anything was found to cancel.
    pub fn request_cancel(&self, project_id: &ProjectId) -> bool {
        if let Some(flag) = self.in_flight.lock().get(project_id.as_str()) {
            flag.cancel();
            true
        } else {
            false
        }
    }

    /// Run the build worker loop for one project. A no-op if a build is
    /// already in flight for it — at most one in-flight build per project.
    pub async fn run(&self, project_id: ProjectId) {
        let cancel = {
            let mut in_flight = self.in_flight.lock();
            if in_flight.contains_key(project_id.as_str()) {
                return;
            }
            let flag = Arc::new(CancelFlag::new());
            in_flight.insert(project_id.as_str().to_string(), flag.clone());
            flag
        };

        if let Err(e) = self.run_inner(&project_id, &cancel).await {
            tracing::warn!(project_id = %project_id, error = %e, "project build pipeline exited with an error");
        }

        self.in_flight.lock().remove(project_id.as_str());
    }

    async fn run_inner(&self, project_id: &ProjectId, cancel: &CancelFlag) -> HubResult<()> {
        // Step 1: load; bail out if there's nothing to do.
        let project = self.store.snapshot().projects.get(project_id.as_str()).cloned();
        let Some(mut project) = project else { return Ok(()) };
        if !matches!(project.build_status, BuildStatus::Pending | BuildStatus::Building) {
            return Ok(());
        }

        self.store.mutate(|state| {
            if let Some(p) = state.projects.get_mut(project_id.as_str()) {
                p.build_status = BuildStatus::Building;
                p.build_started_at = Some(chrono::Utc::now());
                p.build_error = None;
            }
            Ok(())
        })?;
        self.events.publish(HubEvent::StateChanged { reason: "project_build_started".to_string(), at: chrono::Utc::now() });

        bail_if_cancelled(cancel)?;

        // Step 2: clone (lazy) or fetch the workspace.
        let workspace = self.workspace_dir(project_id);
        let credentials_dir = self.data_dir.join("projects").join(project_id.as_str()).join("credentials");
        let git_env = self.materialize_git_env(project_id, &project, &credentials_dir).await?;
        self.sync_workspace(&workspace, &project, &git_env).await?;

        bail_if_cancelled(cancel)?;

        // Step 3: hard-sync to the default branch.
        let branch = self.resolve_default_branch(&project, &git_env).await?;
        self.hard_sync_to_branch(&workspace, &branch, &git_env).await?;

        let head_sha = self.capture_head_sha(&workspace).await?;
        project.repo_head_sha = Some(head_sha.clone());

        bail_if_cancelled(cancel)?;

        // Step 4: fingerprint; early-exit if the image already exists.
        let mut inputs = project.fingerprint_inputs();
        inputs.repo_head_sha = Some(head_sha.clone());
        let tag = setup_snapshot_tag(project.id.short(16), &inputs);

        if self.images.image_exists(&tag).await? {
            return self.finalize_ready(project_id, &tag, &head_sha);
        }

        bail_if_cancelled(cancel)?;

        // Step 5: compile and run the snapshot build, streaming output.
        let dockerfile = self.write_snapshot_dockerfile(&workspace, &project)?;
        let argv = self.compile_snapshot_build_argv(&tag, &dockerfile, &workspace);
        self.run_and_stream(project_id, "docker", &argv, &git_env).await?;

        bail_if_cancelled(cancel)?;

        // Step 6: re-check for supersession before declaring ready.
        let current = self.store.snapshot().projects.get(project_id.as_str()).cloned();
        let Some(current) = current else { return Ok(()) };
        let current_tag = setup_snapshot_tag(current.id.short(16), &current.fingerprint_inputs());
        if current_tag != tag {
            self.store.mutate(|state| {
                if let Some(p) = state.projects.get_mut(project_id.as_str()) {
                    p.build_status = BuildStatus::Pending;
                }
                Ok(())
            })?;
            self.events.publish(HubEvent::StateChanged { reason: "project_build_superseded".to_string(), at: chrono::Utc::now() });
            return Ok(());
        }

        self.finalize_ready(project_id, &tag, &head_sha)
    }

    fn finalize_ready(&self, project_id: &ProjectId, tag: &str, head_sha: &str) -> HubResult<()> {
        self.store.mutate(|state| {
            if let Some(p) = state.projects.get_mut(project_id.as_str()) {
                p.build_status = BuildStatus::Ready;
                p.setup_snapshot_image = Some(tag.to_string());
                p.build_finished_at = Some(chrono::Utc::now());
                p.repo_head_sha = Some(head_sha.to_string());
            }
            Ok(())
        })?;
        self.events.publish(HubEvent::StateChanged { reason: "project_build_ready".to_string(), at: chrono::Utc::now() });
        Ok(())
    }

    async fn materialize_git_env(&self, project_id: &ProjectId, project: &Project, credentials_dir: &Path) -> HubResult<HashMap<String, String>> {
        let catalog = self.store.snapshot().credentials;
        let candidates = resolve_for_repository(&*self.runner, &*self.secrets, credentials_dir, &project.repo_url, &project.credential_binding, &catalog).await;

        let candidates = match candidates {
            Ok(c) => c,
            Err(_) => return Ok(HashMap::new()), // anonymous clone, e.g. a public repo
        };

        let Some(credential_id) = candidates.into_iter().next() else {
            return Ok(HashMap::new());
        };

        let secret = self.secrets.resolve_secret(&credential_id).await?;
        let file = materialize_credential_file(credentials_dir, &credential_id, &secret)?;
        tracing::debug!(project_id = %project_id, credential_id = %credential_id, "materialized clone credential");
        Ok(git_env_for_credential(&file))
    }

    async fn sync_workspace(&self, workspace: &Path, project: &Project, git_env: &HashMap<String, String>) -> HubResult<()> {
        if workspace.join(".git").exists() {
            self.git(workspace, &["fetch", "origin"], git_env).await?;
            return Ok(());
        }

        std::fs::create_dir_all(workspace.parent().unwrap_or(workspace))?;
        let argv = vec!["clone".to_string(), project.repo_url.clone(), workspace.display().to_string()];
        self.run_cmd("git", &argv, git_env).await?;
        Ok(())
    }

    async fn resolve_default_branch(&self, project: &Project, git_env: &HashMap<String, String>) -> HubResult<String> {
        if let Some(branch) = &project.default_branch {
            return Ok(branch.clone());
        }

        let output = self
            .runner
            .run("git", &["ls-remote".to_string(), "--symref".to_string(), project.repo_url.clone(), "HEAD".to_string()], git_env)
            .await
            .map_err(|e| HubError::config(format!("failed to query remote default branch: {e}")))?;

        output
            .stdout
            .lines()
            .find_map(|line| line.strip_prefix("ref: refs/heads/")?.split_whitespace().next())
            .map(str::to_string)
            .ok_or_else(|| HubError::config("could not determine the remote's default branch"))
    }

    async fn hard_sync_to_branch(&self, workspace: &Path, branch: &str, git_env: &HashMap<String, String>) -> HubResult<()> {
        self.git(workspace, &["fetch", "origin", branch], git_env).await?;
        self.git(workspace, &["reset", "--hard", &format!("origin/{branch}")], git_env).await?;
        Ok(())
    }

    async fn capture_head_sha(&self, workspace: &Path) -> HubResult<String> {
        let output = self.git(workspace, &["rev-parse", "HEAD"], &HashMap::new()).await?;
        Ok(output.stdout.trim().to_string())
    }

    fn write_snapshot_dockerfile(&self, workspace: &Path, project: &Project) -> HubResult<PathBuf> {
        let base_image = match project.base_image_mode {
            BaseImageMode::Tag => project.base_image_value.clone(),
            BaseImageMode::RepoPath => format!("file://{}", project.base_image_value),
        };

        let dockerfile = format!(
            "FROM {base_image}\nWORKDIR /workspace\nCOPY . /workspace\nRUN {setup_script}\n",
            base_image = base_image,
            setup_script = project.setup_script,
        );

        let build_dir = workspace.join(".agent-hub-build");
        std::fs::create_dir_all(&build_dir)?;
        let path = build_dir.join("Dockerfile");
        std::fs::write(&path, dockerfile)?;
        Ok(path)
    }

    fn compile_snapshot_build_argv(&self, tag: &str, dockerfile: &Path, workspace: &Path) -> Vec<String> {
        vec![
            "build".to_string(),
            "--tag".to_string(),
            tag.to_string(),
            "--file".to_string(),
            dockerfile.display().to_string(),
            workspace.display().to_string(),
        ]
    }

    /// `git` has no notion of the adapter's own working directory, so every
    /// call is pinned to `dir` with `-C` rather than relying on process cwd.
    async fn git(&self, dir: &Path, args: &[&str], env: &HashMap<String, String>) -> HubResult<agent_hub_adapters::CommandOutput> {
        let mut full_args = vec!["-C".to_string(), dir.display().to_string()];
        full_args.extend(args.iter().map(|s| s.to_string()));
        self.run_cmd("git", &full_args, env).await
    }

    async fn run_cmd(&self, program: &str, args: &[String], env: &HashMap<String, String>) -> HubResult<agent_hub_adapters::CommandOutput> {
        let output = self
            .runner
            .run(program, args, env)
            .await
            .map_err(|e| HubError::Internal(format!("failed to run {program}: {e}")))?;
        if !output.status_success {
            return Err(HubError::config(format!("{program} {args:?} exited with status {}: {}", output.status_code, output.stderr.trim())));
        }
        Ok(output)
    }

    async fn run_and_stream(&self, project_id: &ProjectId, program: &str, args: &[String], env: &HashMap<String, String>) -> HubResult<()> {
        let output = self
            .runner
            .run(program, args, env)
            .await
            .map_err(|e| HubError::Internal(format!("failed to run {program}: {e}")))?;

        let combined = format!("{}{}", output.stdout, output.stderr);
        self.append_build_log(project_id, &combined)?;
        for line in combined.lines() {
            self.events.publish(HubEvent::ProjectBuildLog { project_id: project_id.as_str().to_string(), line: line.to_string() });
        }

        if !output.status_success {
            let last_line = combined.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("build failed").to_string();
            self.store.mutate(|state| {
                if let Some(p) = state.projects.get_mut(project_id.as_str()) {
                    p.build_status = BuildStatus::Failed;
                    p.build_error = Some(last_line.clone());
                    p.build_finished_at = Some(chrono::Utc::now());
                }
                Ok(())
            })?;
            self.events.publish(HubEvent::StateChanged { reason: "project_build_failed".to_string(), at: chrono::Utc::now() });
            return Err(HubError::config(format!("snapshot build failed: {last_line}")));
        }

        Ok(())
    }

    fn append_build_log(&self, project_id: &ProjectId, text: &str) -> HubResult<()> {
        use std::io::Write;
        let path = self.build_log_path(project_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "build_pipeline_tests.rs"]
mod tests;
