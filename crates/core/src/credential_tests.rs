// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn record_probe_sets_timestamp_and_clears_prior_error_on_success() {
    let mut record = CredentialRecord::builder()
        .last_probe_ok(Some(false))
        .last_probe_error(Some("connection refused".into()))
        .build();
    let now = chrono::Utc::now();
    record.record_probe(true, None, now);
    assert_eq!(record.last_probe_ok, Some(true));
    assert_eq!(record.last_probe_error, None);
    assert_eq!(record.last_probed_at, Some(now));
}

#[test]
fn new_pat_credential_id_is_opaque_hex_and_unique() {
    let a = new_pat_credential_id();
    let b = new_pat_credential_id();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 32);
    assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}
