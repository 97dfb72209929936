// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The Hash-Chain Ledger (the "Audit Spine").
//!
//! [`Ledger`] exposes three operations:
//!
//! * [`append`](Ledger::append) — attach a new event to the chain tip.
//! * [`verify`](Ledger::verify) — walk the chain and report the first break.
//! * [`get_by_id`](Ledger::get_by_id) / [`list`](Ledger::list) — read-only access.
//!
//! There is no update or delete path. The chain tip is a single resource;
//! `append` is expected to run under whatever exclusive lock the caller holds
//! (see `gavel-core::ledger::AsyncLedger` for the Tokio-backed version that
//! owns that lock itself).

use chrono::Utc;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::hash::{canonical_json, canonical_timestamp, event_hash};
use crate::storage::LedgerStorage;
use crate::types::{AuditEvent, AuditFilter, ChainVerification, GENESIS};

/// The append-only, hash-chained event log.
///
/// Generic over the backing [`LedgerStorage`] so the same chaining and
/// verification logic runs unchanged over an in-memory store in tests and a
/// durable store in production.
pub struct Ledger<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> Ledger<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Attach a new event to the chain tip.
    ///
    /// `created_at`, `previous_event_hash`, and `event_hash` are computed
    /// here; the caller supplies only the semantic content of the event.
    pub fn append(
        &mut self,
        actor_id: &str,
        action_type: &str,
        intent_payload: serde_json::Value,
        policy_version: &str,
    ) -> Result<AuditEvent, LedgerError> {
        let previous_event_hash = match self.storage.tip() {
            Some(tip) => tip.event_hash,
            None => GENESIS.to_string(),
        };

        let created_at = Utc::now();
        let created_at_text = canonical_timestamp(&created_at);
        let payload_json_text = canonical_json(&intent_payload);

        let hash = event_hash(
            &previous_event_hash,
            actor_id,
            action_type,
            &payload_json_text,
            policy_version,
            &created_at_text,
        );

        let event = AuditEvent {
            id: Uuid::new_v4(),
            created_at,
            actor_id: actor_id.to_string(),
            action_type: action_type.to_string(),
            intent_payload,
            policy_version: policy_version.to_string(),
            event_hash: hash,
            previous_event_hash,
        };

        self.storage.insert(event.clone())?;
        Ok(event)
    }

    /// Walk the ledger in ascending append order, recomputing each
    /// `event_hash` and checking the chain link. Returns the id of the first
    /// event whose stored hash no longer matches what recomputation
    /// produces, or `None` if the chain is intact.
    pub fn verify(&self) -> ChainVerification {
        let events = self.storage.all_ordered();
        let total_events = events.len();
        let mut expected_prev = GENESIS.to_string();

        for event in &events {
            if event.previous_event_hash != expected_prev {
                return ChainVerification {
                    total_events,
                    chain_valid: false,
                    break_at: Some(event.id),
                };
            }

            let recomputed = event_hash(
                &event.previous_event_hash,
                &event.actor_id,
                &event.action_type,
                &canonical_json(&event.intent_payload),
                &event.policy_version,
                &canonical_timestamp(&event.created_at),
            );

            if recomputed != event.event_hash {
                return ChainVerification {
                    total_events,
                    chain_valid: false,
                    break_at: Some(event.id),
                };
            }

            expected_prev = event.event_hash.clone();
        }

        ChainVerification {
            total_events,
            chain_valid: true,
            break_at: None,
        }
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<AuditEvent> {
        self.storage.get_by_id(id)
    }

    pub fn list(&self, filter: &AuditFilter, page: usize, size: usize) -> Vec<AuditEvent> {
        self.storage.list(filter, page, size)
    }

    /// Borrow the underlying storage (read-only).
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use serde_json::json;

    fn new_ledger() -> Ledger<InMemoryStorage> {
        Ledger::new(InMemoryStorage::new())
    }

    #[test]
    fn first_append_chains_from_genesis() {
        let mut ledger = new_ledger();
        let event = ledger
            .append("agent:a", "INBOUND_INTENT", json!({"cmd": "ls"}), "v1")
            .unwrap();
        assert_eq!(event.previous_event_hash, GENESIS);
        assert_eq!(event.event_hash.len(), 64);
    }

    #[test]
    fn second_append_chains_to_first_hash() {
        let mut ledger = new_ledger();
        let first = ledger
            .append("agent:a", "INBOUND_INTENT", json!({}), "v1")
            .unwrap();
        let second = ledger
            .append("agent:a", "POLICY_EVAL:APPROVED", json!({}), "v1")
            .unwrap();
        assert_eq!(second.previous_event_hash, first.event_hash);
    }

    #[test]
    fn verify_reports_valid_chain() {
        let mut ledger = new_ledger();
        for i in 0..5 {
            ledger
                .append("agent:a", "INBOUND_INTENT", json!({"i": i}), "v1")
                .unwrap();
        }
        let result = ledger.verify();
        assert!(result.chain_valid);
        assert_eq!(result.total_events, 5);
        assert!(result.break_at.is_none());
    }

    #[test]
    fn verify_empty_chain_is_valid() {
        let ledger = new_ledger();
        let result = ledger.verify();
        assert!(result.chain_valid);
        assert_eq!(result.total_events, 0);
    }

    #[test]
    fn verify_detects_tampered_actor_id() {
        let mut ledger = new_ledger();
        let first = ledger
            .append("agent:a", "INBOUND_INTENT", json!({}), "v1")
            .unwrap();
        let second = ledger
            .append("agent:a", "POLICY_EVAL:APPROVED", json!({}), "v1")
            .unwrap();

        // Rebuild storage out-of-band with the second event's actor_id
        // mutated but its event_hash left as originally computed — exactly
        // what an out-of-band UPDATE against the backing store would do.
        let mut tampered = second.clone();
        tampered.actor_id = "agent:mallory".into();

        let mut raw_storage = InMemoryStorage::new();
        raw_storage.insert(first).unwrap();
        raw_storage.insert(tampered).unwrap();
        let tampered_ledger = Ledger::new(raw_storage);

        let result = tampered_ledger.verify();
        assert!(!result.chain_valid);
        assert_eq!(result.break_at, Some(second.id));
    }

    #[test]
    fn event_hash_recomputation_matches_canonical_format() {
        let mut ledger = new_ledger();
        let event = ledger
            .append("agent:a", "INBOUND_INTENT", json!({"b": 1, "a": 2}), "v1")
            .unwrap();

        let expected = event_hash(
            GENESIS,
            "agent:a",
            "INBOUND_INTENT",
            &canonical_json(&json!({"a": 2, "b": 1})),
            "v1",
            &canonical_timestamp(&event.created_at),
        );
        assert_eq!(event.event_hash, expected);
    }
}
