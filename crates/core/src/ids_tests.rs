// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn project_id_round_trips() {
    let id = ProjectId::new();
    assert!(id.as_str().starts_with("proj-"));
    assert_eq!(ProjectId::from_string(id.as_str()), id);
}

#[test]
fn chat_id_round_trips() {
    let id = ChatId::new();
    assert!(id.as_str().starts_with("chat-"));
}

#[test]
fn credential_id_github_app_format() {
    let id = CredentialId::github_app(42);
    assert_eq!(id.as_str(), "github_app:42");
}

#[test]
fn credential_id_from_opaque_hex() {
    let id = CredentialId::from("a1b2c3d4".to_string());
    assert_eq!(id.to_string(), "a1b2c3d4");
}

#[test]
fn credential_id_borrows_as_str_for_map_lookup() {
    use std::collections::HashMap;
    let mut map: HashMap<CredentialId, u32> = HashMap::new();
    map.insert(CredentialId::from("abc"), 1);
    assert_eq!(map.get("abc"), Some(&1));
}
