// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ansi_stripper_removes_a_complete_csi_sequence() {
    let mut stripper = AnsiStripper::new();
    let visible = stripper.feed(b"hello \x1b[31mworld\x1b[0m!");
    assert_eq!(String::from_utf8(visible).unwrap(), "hello world!");
}

#[test]
fn ansi_stripper_carries_a_split_sequence_across_feeds() {
    let mut stripper = AnsiStripper::new();
    let first = stripper.feed(b"abc\x1b[3");
    let second = stripper.feed(b"1mdef");
    assert_eq!(String::from_utf8(first).unwrap(), "abc");
    assert_eq!(String::from_utf8(second).unwrap(), "def");
}

#[test]
fn ansi_stripper_removes_osc_sequence_terminated_by_bel() {
    let mut stripper = AnsiStripper::new();
    let visible = stripper.feed(b"\x1b]0;title\x07ready");
    assert_eq!(String::from_utf8(visible).unwrap(), "ready");
}

#[test]
fn side_channel_emits_submitted_prompt_on_carriage_return() {
    let mut channel = InputSideChannel::new();
    let submissions = channel.observe(b"fix the bug\r");
    assert_eq!(submissions, vec!["fix the bug".to_string()]);
}

#[test]
fn side_channel_compacts_internal_whitespace() {
    let mut channel = InputSideChannel::new();
    let submissions = channel.observe(b"fix   the    bug\n");
    assert_eq!(submissions, vec!["fix the bug".to_string()]);
}

#[test]
fn side_channel_honors_backspace_and_ctrl_u() {
    let mut channel = InputSideChannel::new();
    let submissions = channel.observe(b"helloo\x08\x15world\r");
    assert_eq!(submissions, vec!["world".to_string()]);
}

#[test]
fn side_channel_ignores_empty_submissions() {
    let mut channel = InputSideChannel::new();
    let submissions = channel.observe(b"\r\n   \r");
    assert!(submissions.is_empty());
}

#[test]
fn side_channel_normalizes_keypad_enter() {
    let mut channel = InputSideChannel::new();
    let submissions = channel.observe(b"go\x1bOM");
    assert_eq!(submissions, vec!["go".to_string()]);
}
