// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agent_hub_core::enums::ReadyAckStage;

#[test]
fn mint_start_tokens_produces_distinct_plaintexts_and_matching_hashes() {
    let tokens = mint_start_tokens();
    assert_ne!(tokens.agent_tools.plaintext, tokens.artifact_publish.plaintext);
    assert_eq!(tokens.agent_tools.sha256_hex, hash_token(&tokens.agent_tools.plaintext));
    assert_eq!(tokens.agent_tools.plaintext.len(), 48); // 24 bytes, hex-encoded
}

#[test]
fn token_matches_accepts_the_right_plaintext_and_rejects_others() {
    let tokens = mint_start_tokens();
    assert!(token_matches(&tokens.agent_tools.plaintext, &tokens.agent_tools.sha256_hex));
    assert!(!token_matches("wrong-token", &tokens.agent_tools.sha256_hex));
}

#[test]
fn validate_ready_ack_rejects_mismatched_guid() {
    assert!(!validate_ready_ack("expected", "other", ReadyAckStage::ContainerBootstrapped, None));
}

#[test]
fn validate_ready_ack_accepts_stages_in_order() {
    assert!(validate_ready_ack("g", "g", ReadyAckStage::ContainerBootstrapped, None));
    assert!(validate_ready_ack("g", "g", ReadyAckStage::AgentProcessStarted, Some(ReadyAckStage::ContainerBootstrapped)));
}

#[test]
fn validate_ready_ack_rejects_out_of_order_stage() {
    assert!(!validate_ready_ack("g", "g", ReadyAckStage::AgentProcessStarted, None));
    assert!(!validate_ready_ack("g", "g", ReadyAckStage::ContainerBootstrapped, Some(ReadyAckStage::ContainerBootstrapped)));
}
