// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch Compiler: turns a chat's resolved configuration into
//! a deterministic `docker run` argv, and can parse that argv back into a
//! [`LaunchSpec`] for tests and for inspecting a running container's
//! reconstructed configuration during reconciliation.

use crate::identity::ResolvedIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host_path: String,
    pub container_path: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub container_name: String,
    pub image: String,
    pub identity: ResolvedIdentity,
    pub mounts: Vec<Mount>,
    pub env_vars: Vec<(String, String)>,
    pub workdir: String,
    pub agent_command: Vec<String>,
}

/// Compile a [`LaunchSpec`] into `docker run` argv.
///
/// Mounts and env vars are sorted before emission so two specs with the
/// same logical content always compile to byte-identical argv — the build
/// pipeline and reconciliation both rely on this to detect "nothing
/// actually changed" without a semantic diff.
pub fn compile_launch_argv(spec: &LaunchSpec) -> Vec<String> {
    let mut argv = vec![
        "run".to_string(),
        "--rm".to_string(),
        "--init".to_string(),
        "--tmpfs".to_string(),
        "/tmp:mode=1777,exec".to_string(),
        "--name".to_string(),
        spec.container_name.clone(),
    ];

    argv.push("--user".to_string());
    argv.push(format!("{}:{}", spec.identity.uid, spec.identity.gid));

    let mut mounts = spec.mounts.clone();
    mounts.sort_by(|a, b| a.container_path.cmp(&b.container_path));
    for mount in &mounts {
        argv.push("--mount".to_string());
        let mode = if mount.read_only { "ro" } else { "rw" };
        argv.push(format!("type=bind,source={},target={},readonly={}", mount.host_path, mount.container_path, mode == "ro"));
    }

    let mut env_vars = spec.env_vars.clone();
    env_vars.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in &env_vars {
        argv.push("--env".to_string());
        argv.push(format!("{key}={value}"));
    }

    argv.push("--workdir".to_string());
    argv.push(spec.workdir.clone());

    argv.push(spec.image.clone());
    argv.extend(spec.agent_command.iter().cloned());
    argv
}

#[derive(Debug, thiserror::Error)]
pub enum ParseArgvError {
    #[error("unexpected token at position {0}: {1:?}")]
    UnexpectedToken(usize, String),
    #[error("malformed --mount value: {0:?}")]
    MalformedMount(String),
    #[error("malformed --env value: {0:?}")]
    MalformedEnv(String),
    #[error("malformed --user value: {0:?}")]
    MalformedUser(String),
    #[error("missing image after flags")]
    MissingImage,
}

/// Reconstruct a [`LaunchSpec`] from argv produced by [`compile_launch_argv`].
///
/// Only understands the flag shapes this compiler emits; it is not a
/// general `docker run` argv parser.
pub fn parse_launch_argv(argv: &[String]) -> Result<LaunchSpec, ParseArgvError> {
    let mut i = 0;
    let mut container_name = None;
    let mut uid = None;
    let mut gid = None;
    let mut mounts = Vec::new();
    let mut env_vars = Vec::new();
    let mut workdir = None;

    while i < argv.len() {
        match argv[i].as_str() {
            "run" | "--rm" | "--init" => i += 1,
            "--tmpfs" => i += 2,
            "--name" => {
                container_name = Some(argv.get(i + 1).cloned().ok_or(ParseArgvError::UnexpectedToken(i, argv[i].clone()))?);
                i += 2;
            }
            "--user" => {
                let value = argv.get(i + 1).ok_or(ParseArgvError::UnexpectedToken(i, argv[i].clone()))?;
                let (u, g) = value.split_once(':').ok_or_else(|| ParseArgvError::MalformedUser(value.clone()))?;
                uid = Some(u.parse::<u32>().map_err(|_| ParseArgvError::MalformedUser(value.clone()))?);
                gid = Some(g.parse::<u32>().map_err(|_| ParseArgvError::MalformedUser(value.clone()))?);
                i += 2;
            }
            "--mount" => {
                let value = argv.get(i + 1).ok_or(ParseArgvError::UnexpectedToken(i, argv[i].clone()))?;
                mounts.push(parse_mount(value)?);
                i += 2;
            }
            "--env" => {
                let value = argv.get(i + 1).ok_or(ParseArgvError::UnexpectedToken(i, argv[i].clone()))?;
                let (k, v) = value.split_once('=').ok_or_else(|| ParseArgvError::MalformedEnv(value.clone()))?;
                env_vars.push((k.to_string(), v.to_string()));
                i += 2;
            }
            "--workdir" => {
                workdir = Some(argv.get(i + 1).cloned().ok_or(ParseArgvError::UnexpectedToken(i, argv[i].clone()))?);
                i += 2;
            }
            _ => break,
        }
    }

    let image = argv.get(i).cloned().ok_or(ParseArgvError::MissingImage)?;
    let agent_command = argv[i + 1..].to_vec();

    Ok(LaunchSpec {
        container_name: container_name.ok_or(ParseArgvError::UnexpectedToken(0, "missing --name".into()))?,
        image,
        identity: ResolvedIdentity {
            uid: uid.ok_or(ParseArgvError::UnexpectedToken(0, "missing --user".into()))?,
            gid: gid.ok_or(ParseArgvError::UnexpectedToken(0, "missing --user".into()))?,
        },
        mounts,
        env_vars,
        workdir: workdir.ok_or(ParseArgvError::UnexpectedToken(0, "missing --workdir".into()))?,
        agent_command,
    })
}

fn parse_mount(value: &str) -> Result<Mount, ParseArgvError> {
    let mut source = None;
    let mut target = None;
    let mut readonly = false;
    for field in value.split(',') {
        let (key, val) = field.split_once('=').ok_or_else(|| ParseArgvError::MalformedMount(value.to_string()))?;
        match key {
            "type" => {}
            "source" => source = Some(val.to_string()),
            "target" => target = Some(val.to_string()),
            "readonly" => readonly = val == "true",
            _ => {}
        }
    }
    Ok(Mount {
        host_path: source.ok_or_else(|| ParseArgvError::MalformedMount(value.to_string()))?,
        container_path: target.ok_or_else(|| ParseArgvError::MalformedMount(value.to_string()))?,
        read_only: readonly,
    })
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
