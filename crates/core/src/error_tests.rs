// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn error_code_is_stable_regardless_of_detail() {
    let a = HubError::CredentialResolution("no pat for host a".into());
    let b = HubError::CredentialResolution("totally different detail".into());
    assert_eq!(a.code(), b.code());
    assert_eq!(a.user_message(), b.user_message());
    assert_eq!(a.code(), "CREDENTIAL_RESOLUTION_ERROR");
}

#[test]
fn status_codes_match_spec_section_7() {
    assert_eq!(HubError::config("x").status_code(), 400);
    assert_eq!(HubError::mount_visibility("x").status_code(), 409);
    assert_eq!(HubError::network_reachability("x").status_code(), 502);
    assert_eq!(HubError::credential_resolution("x").status_code(), 401);
}

#[test]
fn io_error_maps_to_internal() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
    let err: HubError = io.into();
    assert_eq!(err.code(), "INTERNAL_ERROR");
}

#[test]
fn json_error_maps_to_config() {
    let parsed: Result<serde_json::Value, _> = serde_json::from_str("{not json");
    let err: HubError = parsed.unwrap_err().into();
    assert_eq!(err.code(), "CONFIG_ERROR");
}
