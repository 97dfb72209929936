// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Storage abstraction for the Ledger.
//!
//! [`LedgerStorage`] is the single interface between [`crate::ledger::Ledger`]
//! and any persistence layer. This crate ships [`InMemoryStorage`] for
//! development and testing. Production implementations (file-backed,
//! SQL-backed) live in the `gavel-storage` crate so this crate stays free of
//! any particular database dependency.
//!
//! The trait intentionally exposes no update or delete path — there is none
//! to expose. Immutability is enforced by the storage layer having no such
//! method, not by a runtime check.

use uuid::Uuid;

use crate::error::LedgerError;
use crate::types::{AuditEvent, AuditFilter};

/// Pluggable append-only persistence for the Ledger.
///
/// Implementations MUST be `Send + Sync` so the ledger can be shared across
/// async tasks when wrapped in `Arc<Mutex<...>>` (see `gavel-core::ledger`
/// under the `async` feature).
pub trait LedgerStorage: Send + Sync {
    /// The most recently inserted event, or `None` if the chain is empty.
    fn tip(&self) -> Option<AuditEvent>;

    /// Insert a fully-formed event (hash and chain link already computed).
    /// Implementations that front a real database should perform this under
    /// the same transaction/lock that read the prior tip.
    fn insert(&mut self, event: AuditEvent) -> Result<(), LedgerError>;

    /// Look up a single event by id.
    fn get_by_id(&self, id: Uuid) -> Option<AuditEvent>;

    /// All events in ascending `(created_at, id)` order — the order the
    /// chain was built in. Used by `verify()` and by `list()` before
    /// filtering/paging is applied.
    fn all_ordered(&self) -> Vec<AuditEvent>;

    /// Filtered, paged read. `page` is 1-indexed; `size` is the page length.
    fn list(&self, filter: &AuditFilter, page: usize, size: usize) -> Vec<AuditEvent> {
        let filtered: Vec<AuditEvent> = self
            .all_ordered()
            .into_iter()
            .filter(|e| match &filter.actor_id {
                Some(a) => &e.actor_id == a,
                None => true,
            })
            .filter(|e| match &filter.action_type {
                Some(a) => &e.action_type == a,
                None => true,
            })
            .filter(|e| match filter.since {
                Some(since) => e.created_at >= since,
                None => true,
            })
            .filter(|e| match filter.until {
                Some(until) => e.created_at <= until,
                None => true,
            })
            .collect();

        let start = page.saturating_sub(1).saturating_mul(size);
        filtered.into_iter().skip(start).take(size).collect()
    }
}

/// Forwards to the boxed trait object, so a caller that only learns which
/// concrete backend to use at runtime (e.g. `gavel-server` choosing between
/// file- and SQL-backed storage from configuration) can monomorphize
/// `Ledger`/`ControlPlane` over `Box<dyn LedgerStorage>` once instead of
/// over every concrete backend.
impl LedgerStorage for Box<dyn LedgerStorage> {
    fn tip(&self) -> Option<AuditEvent> {
        (**self).tip()
    }

    fn insert(&mut self, event: AuditEvent) -> Result<(), LedgerError> {
        (**self).insert(event)
    }

    fn get_by_id(&self, id: Uuid) -> Option<AuditEvent> {
        (**self).get_by_id(id)
    }

    fn all_ordered(&self) -> Vec<AuditEvent> {
        (**self).all_ordered()
    }

    fn list(&self, filter: &AuditFilter, page: usize, size: usize) -> Vec<AuditEvent> {
        (**self).list(filter, page, size)
    }
}

// ---------------------------------------------------------------------------
// InMemoryStorage
// ---------------------------------------------------------------------------

/// A volatile, heap-allocated [`LedgerStorage`] implementation.
///
/// All data lives in process memory and is lost when dropped. Suitable for
/// tests and for a single-process development server.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    events: Vec<AuditEvent>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStorage for InMemoryStorage {
    fn tip(&self) -> Option<AuditEvent> {
        self.events.last().cloned()
    }

    fn insert(&mut self, event: AuditEvent) -> Result<(), LedgerError> {
        if self.events.iter().any(|e| e.id == event.id) {
            return Err(LedgerError::Storage("duplicate event id".into()));
        }
        self.events.push(event);
        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> Option<AuditEvent> {
        self.events.iter().find(|e| e.id == id).cloned()
    }

    fn all_ordered(&self) -> Vec<AuditEvent> {
        self.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn sample_event(actor: &str) -> AuditEvent {
        AuditEvent {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            actor_id: actor.into(),
            action_type: "INBOUND_INTENT".into(),
            intent_payload: json!({}),
            policy_version: "v1".into(),
            event_hash: "deadbeef".into(),
            previous_event_hash: "GENESIS".into(),
        }
    }

    #[test]
    fn tip_is_none_on_empty_store() {
        let store = InMemoryStorage::new();
        assert!(store.tip().is_none());
    }

    #[test]
    fn insert_and_get_by_id_round_trips() {
        let mut store = InMemoryStorage::new();
        let event = sample_event("agent:a");
        let id = event.id;
        store.insert(event).unwrap();
        assert_eq!(store.get_by_id(id).unwrap().id, id);
        assert_eq!(store.tip().unwrap().id, id);
    }

    #[test]
    fn list_filters_by_actor() {
        let mut store = InMemoryStorage::new();
        store.insert(sample_event("agent:a")).unwrap();
        store.insert(sample_event("agent:b")).unwrap();

        let filter = AuditFilter {
            actor_id: Some("agent:a".into()),
            ..Default::default()
        };
        let results = store.list(&filter, 1, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].actor_id, "agent:a");
    }

    #[test]
    fn list_pages_results() {
        let mut store = InMemoryStorage::new();
        for _ in 0..5 {
            store.insert(sample_event("agent:a")).unwrap();
        }
        let page1 = store.list(&AuditFilter::default(), 1, 2);
        let page2 = store.list(&AuditFilter::default(), 2, 2);
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_ne!(page1[0].id, page2[0].id);
    }
}
