// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Canonical encoding and SHA-256 hashing shared by the Ledger and the
//! Blast Box evidence packet.
//!
//! Canonicalization must be byte-identical between the writer (`append`)
//! and the reader (`verify`), or the chain will appear broken to a verifier
//! that recomputes hashes independently. Two rules keep that true:
//!
//! * `serde_json::Value` objects are serialized with their keys sorted —
//!   `serde_json`'s default `Map` preserves insertion order, which is not
//!   guaranteed to match across callers, so we re-serialize through a
//!   `BTreeMap` to force a stable order.
//! * Timestamps are rendered as RFC 3339 with fixed millisecond precision
//!   and a literal `Z` suffix, never the platform's local format.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Render `value` with object keys sorted, recursively, so the same JSON
/// document always serializes to the same bytes regardless of how it was
/// constructed.
pub fn canonical_json(value: &serde_json::Value) -> String {
    serde_json::to_string(&sort_keys(value)).expect("canonical JSON values always serialize")
}

fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<String, serde_json::Value> =
                map.iter().map(|(k, v)| (k.clone(), sort_keys(v))).collect();
            serde_json::to_value(sorted).expect("BTreeMap<String, Value> always serializes")
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sort_keys).collect())
        }
        other => other.clone(),
    }
}

/// Canonical textual form of a timestamp used in both the hash input and
/// the persisted representation: RFC 3339, millisecond precision, `Z` suffix.
pub fn canonical_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Compute `SHA256(prev_hash | actor_id | action_type | payload_json_text | policy_version | created_at_text)`.
///
/// The five pipe characters are literal ASCII `|`, matching the wire format
/// documented for the ledger's canonical hash input.
pub fn event_hash(
    prev_hash: &str,
    actor_id: &str,
    action_type: &str,
    payload_json_text: &str,
    policy_version: &str,
    created_at_text: &str,
) -> String {
    let input = format!(
        "{prev_hash}|{actor_id}|{action_type}|{payload_json_text}|{policy_version}|{created_at_text}"
    );
    sha256_hex(input.as_bytes())
}

/// Hex-encode the SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_sorts_keys() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let a = serde_json::json!({"outer": {"z": 1, "y": 2}});
        let b = serde_json::json!({"outer": {"y": 2, "z": 1}});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn event_hash_is_deterministic() {
        let h1 = event_hash("GENESIS", "agent:a", "INBOUND_INTENT", "{}", "v1", "2026-01-01T00:00:00.000Z");
        let h2 = event_hash("GENESIS", "agent:a", "INBOUND_INTENT", "{}", "v1", "2026-01-01T00:00:00.000Z");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn event_hash_changes_with_any_field() {
        let base = event_hash("GENESIS", "agent:a", "INBOUND_INTENT", "{}", "v1", "2026-01-01T00:00:00.000Z");
        let changed = event_hash("GENESIS", "agent:b", "INBOUND_INTENT", "{}", "v1", "2026-01-01T00:00:00.000Z");
        assert_ne!(base, changed);
    }
}
