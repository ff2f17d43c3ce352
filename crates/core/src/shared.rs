// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small parsing helpers shared across crates, consolidated so every call
//! site normalizes comma-separated config values and `host:port` pairs the
//! same way instead of reimplementing `split(',')` locally.

use crate::error::HubError;

/// Split, trim, and drop empty entries from a comma-separated list,
/// returning the canonical re-joined form.
pub fn normalize_csv(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a comma-separated list into owned parts with no re-joining.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated list of non-negative group ids.
///
/// Duplicates are dropped, order of first occurrence is preserved. Invalid
/// (non-numeric) tokens are skipped rather than erroring: supplementary
/// gids are best-effort identity augmentation, not load-bearing the way
/// primary uid/gid are.
pub fn parse_gid_csv(value: &str) -> Vec<u32> {
    let mut gids = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for token in value.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Ok(gid) = token.parse::<u32>() {
            if seen.insert(gid) {
                gids.push(gid);
            }
        }
    }
    gids
}

/// Split a `host` or `host:port` string into its parts.
///
/// An empty host is returned as `("", None)` rather than an error (callers
/// treat a blank host as "not configured").
pub fn split_host_port(host: &str) -> Result<(String, Option<u16>), HubError> {
    let candidate = host.trim().to_lowercase();
    if candidate.is_empty() {
        return Ok((String::new(), None));
    }
    let Some((hostname, port_text)) = candidate.rsplit_once(':') else {
        return Ok((candidate, None));
    };
    let port: u16 = port_text
        .parse()
        .map_err(|_| HubError::config(format!("invalid git credential host: {host}")))?;
    if hostname.is_empty() || port == 0 {
        return Err(HubError::config(format!("invalid git credential host: {host}")));
    }
    Ok((hostname.to_string(), Some(port)))
}

/// Parse a non-negative integer from a config/env value, rejecting blank or
/// negative input with a uniform message (identity fields route through
/// this so uid/gid parsing errors read the same everywhere).
pub fn parse_non_negative_int(raw: &str, source_name: &str) -> Result<u32, HubError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HubError::identity(format!(
            "invalid {source_name}: expected non-negative integer, got {raw:?}"
        )));
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| HubError::identity(format!("invalid {source_name}: expected non-negative integer, got {raw:?}")))
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
