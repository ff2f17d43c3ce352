// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample_spec() -> LaunchSpec {
    LaunchSpec {
        container_name: "agent-hub-chat-test".into(),
        image: "agent-hub-setup-abcd-0123456789abcdef".into(),
        identity: ResolvedIdentity { uid: 1000, gid: 1000 },
        mounts: vec![
            Mount { host_path: "/home/user/repo".into(), container_path: "/workspace".into(), read_only: false },
            Mount { host_path: "/home/user/secrets".into(), container_path: "/secrets".into(), read_only: true },
        ],
        env_vars: vec![("FOO".into(), "bar".into()), ("AGENT_TYPE".into(), "codex".into())],
        workdir: "/workspace".into(),
        agent_command: vec!["codex".into(), "--yolo".into()],
    }
}

#[test]
fn compile_then_parse_round_trips() {
    let spec = sample_spec();
    let argv = compile_launch_argv(&spec);
    let parsed = parse_launch_argv(&argv).unwrap();

    let mut expected_mounts = spec.mounts.clone();
    expected_mounts.sort_by(|a, b| a.container_path.cmp(&b.container_path));
    let mut expected_env = spec.env_vars.clone();
    expected_env.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(parsed.container_name, spec.container_name);
    assert_eq!(parsed.image, spec.image);
    assert_eq!(parsed.identity, spec.identity);
    assert_eq!(parsed.mounts, expected_mounts);
    assert_eq!(parsed.env_vars, expected_env);
    assert_eq!(parsed.workdir, spec.workdir);
    assert_eq!(parsed.agent_command, spec.agent_command);
}

#[test]
fn compile_is_deterministic_regardless_of_input_order() {
    let mut spec_a = sample_spec();
    let mut spec_b = sample_spec();
    spec_a.mounts.reverse();
    spec_b.env_vars.reverse();

    assert_eq!(compile_launch_argv(&spec_a), compile_launch_argv(&sample_spec()));
    assert_eq!(compile_launch_argv(&spec_b), compile_launch_argv(&sample_spec()));
}

#[test]
fn parse_rejects_argv_missing_image() {
    let argv = vec!["run".to_string(), "--rm".to_string(), "--name".to_string(), "x".to_string()];
    assert!(parse_launch_argv(&argv).is_err());
}

#[test]
fn compiled_argv_omits_detach_and_carries_rm_init_tmpfs() {
    let spec = sample_spec();
    let argv = compile_launch_argv(&spec);

    assert!(!argv.contains(&"--detach".to_string()), "must run attached so the PTY reader sees real output, not immediate EOF");
    assert!(argv.contains(&"--rm".to_string()));
    assert!(argv.contains(&"--init".to_string()));
    let tmpfs_idx = argv.iter().position(|a| a == "--tmpfs").expect("--tmpfs flag present");
    assert_eq!(argv[tmpfs_idx + 1], "/tmp:mode=1777,exec");
}

#[test]
fn parse_rejects_malformed_user_flag() {
    let argv = vec!["--user".to_string(), "not-a-pair".to_string(), "image".to_string()];
    assert!(matches!(parse_launch_argv(&argv), Err(ParseArgvError::MalformedUser(_))));
}
