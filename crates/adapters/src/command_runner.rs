// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable subprocess execution, so probing and OAuth relay code can be
//! exercised in tests without ever shelling out for real (grounded on the
//! adapter-trait pattern the coop agent adapter uses for its HTTP boundary).

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_success: bool,
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], env: &HashMap<String, String>) -> std::io::Result<CommandOutput>;
}

/// Runs commands via the real OS process table.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String], env: &HashMap<String, String>) -> std::io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            status_success: output.status.success(),
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    /// Records every invocation and returns scripted responses in order,
    /// falling back to the last scripted response once exhausted.
    #[derive(Default)]
    pub struct FakeCommandRunner {
        responses: Mutex<Vec<std::io::Result<CommandOutput>>>,
        pub invocations: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeCommandRunner {
        pub fn new(responses: Vec<std::io::Result<CommandOutput>>) -> Self {
            Self { responses: Mutex::new(responses), invocations: Mutex::new(Vec::new()) }
        }

        pub fn always_ok() -> Self {
            Self::new(vec![Ok(CommandOutput {
                status_success: true,
                status_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            })])
        }

        pub fn always_fail(stderr: impl Into<String>) -> Self {
            Self::new(vec![Ok(CommandOutput {
                status_success: false,
                status_code: 1,
                stdout: String::new(),
                stderr: stderr.into(),
            })])
        }
    }

    #[async_trait]
    impl CommandRunner for FakeCommandRunner {
        async fn run(&self, program: &str, args: &[String], _env: &HashMap<String, String>) -> std::io::Result<CommandOutput> {
            self.invocations.lock().push((program.to_string(), args.to_vec()));
            let mut responses = self.responses.lock();
            if responses.len() > 1 {
                responses.remove(0)
            } else if let Some(last) = responses.first() {
                clone_result(last)
            } else {
                Ok(CommandOutput { status_success: true, status_code: 0, stdout: String::new(), stderr: String::new() })
            }
        }
    }

    fn clone_result(r: &std::io::Result<CommandOutput>) -> std::io::Result<CommandOutput> {
        match r {
            Ok(output) => Ok(output.clone()),
            Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "command_runner_tests.rs"]
mod tests;
