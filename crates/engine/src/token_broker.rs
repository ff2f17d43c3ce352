// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session / Token Broker: mints the two bearer tokens issued
//! on every chat start and the ready-ack GUID, and validates incoming
//! tokens by constant-time hash comparison.

use agent_hub_core::enums::ReadyAckStage;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A freshly minted bearer token: the plaintext to hand to the container,
/// and the hash to persist on the chat.
pub struct IssuedToken {
    pub plaintext: String,
    pub sha256_hex: String,
}

fn mint_hex_token(byte_len: usize) -> IssuedToken {
    let mut raw = vec![0u8; byte_len];
    rand::Rng::fill(&mut rand::thread_rng(), raw.as_mut_slice());
    let plaintext = hex::encode(raw);
    let sha256_hex = hash_token(&plaintext);
    IssuedToken { plaintext, sha256_hex }
}

pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// Two independent 24-byte tokens, rotated on every (re)start.
pub struct StartTokens {
    pub agent_tools: IssuedToken,
    pub artifact_publish: IssuedToken,
    pub ready_ack_guid: String,
}

pub fn mint_start_tokens() -> StartTokens {
    StartTokens {
        agent_tools: mint_hex_token(24),
        artifact_publish: mint_hex_token(24),
        ready_ack_guid: Uuid::new_v4().to_string(),
    }
}

/// Constant-time comparison of a presented token's hash against the
/// persisted hash, so timing cannot leak how many leading bytes matched.
pub fn token_matches(presented_plaintext: &str, persisted_sha256_hex: &str) -> bool {
    let presented_hash = hash_token(presented_plaintext);
    constant_time_eq(presented_hash.as_bytes(), persisted_sha256_hex.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Validate a ready-ack: the GUID must match exactly and the stage must be
/// one the chat hasn't already acknowledged out of order.
pub fn validate_ready_ack(expected_guid: &str, presented_guid: &str, stage: ReadyAckStage, already_acked: Option<ReadyAckStage>) -> bool {
    if expected_guid != presented_guid {
        return false;
    }
    match (already_acked, stage) {
        (None, ReadyAckStage::ContainerBootstrapped) => true,
        (Some(ReadyAckStage::ContainerBootstrapped), ReadyAckStage::AgentProcessStarted) => true,
        _ => false,
    }
}

#[cfg(test)]
#[path = "token_broker_tests.rs"]
mod tests;
