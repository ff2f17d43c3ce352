// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeCommandRunner;
use super::*;

#[tokio::test]
async fn fake_runner_records_invocations() {
    let runner = FakeCommandRunner::always_ok();
    let env = HashMap::new();
    runner.run("git", &["ls-remote".to_string(), "origin".to_string()], &env).await.unwrap();

    let invocations = runner.invocations.lock();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].0, "git");
}

#[tokio::test]
async fn fake_runner_reports_failure() {
    let runner = FakeCommandRunner::always_fail("authentication failed");
    let env = HashMap::new();
    let output = runner.run("git", &["ls-remote".to_string()], &env).await.unwrap();

    assert!(!output.status_success);
    assert_eq!(output.stderr, "authentication failed");
}
