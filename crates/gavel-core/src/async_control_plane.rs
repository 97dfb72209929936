// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Async wrapper over [`ControlPlane`] for multi-request Tokio servers.
//!
//! This module is only compiled when the `async` feature flag is enabled:
//!
//! ```toml
//! [dependencies]
//! gavel-core = { version = "0.1", features = ["async"] }
//! ```
//!
//! # Design
//!
//! Per §5 of the control plane's concurrency model, the chain tip is a
//! single resource and all appends must serialize through one exclusive
//! lock. [`AsyncControlPlane`] holds the whole [`ControlPlane`] behind an
//! `Arc<tokio::sync::Mutex<...>>` rather than locking the Ledger alone:
//! `propose`'s multi-event sequence (intent → policy eval → optional
//! consumption) must itself run without another task's append landing in
//! the middle, or the ordering guarantee in §4.4 would not hold. Readers
//! (`verify`, `approval_state`) take the same lock — there is no separate
//! read path, since this crate has no data structure cheaper to read
//! concurrently than the lock itself guards.
//!
//! Clone the handle (cheap `Arc` clone) to share one control plane across
//! Gateway request tasks.

#![cfg(feature = "async")]

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::approval::DEFAULT_APPROVAL_TTL_SECONDS;
use crate::control_plane::ControlPlane;
use crate::error::{ApprovalError, ControlPlaneError, LedgerError};
use crate::storage::LedgerStorage;
use crate::types::{ApprovalRecord, AuditEvent, ChainVerification, EvidencePacket, ProposeOutcome};

/// Tokio-friendly handle to a [`ControlPlane`], safe to clone and share
/// across tasks.
#[derive(Clone)]
pub struct AsyncControlPlane<S: LedgerStorage> {
    inner: Arc<Mutex<ControlPlane<S>>>,
}

impl<S: LedgerStorage> AsyncControlPlane<S> {
    pub fn new(storage: S) -> Self {
        Self::with_approval_ttl(storage, DEFAULT_APPROVAL_TTL_SECONDS)
    }

    pub fn with_approval_ttl(storage: S, approval_ttl_seconds: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControlPlane::with_approval_ttl(
                storage,
                approval_ttl_seconds,
            ))),
        }
    }

    pub async fn propose(
        &self,
        actor_id: &str,
        action_type: &str,
        content: &str,
    ) -> Result<ProposeOutcome, ControlPlaneError> {
        let mut plane = self.inner.lock().await;
        plane.propose(actor_id, action_type, content)
    }

    pub async fn approve(
        &self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
        approver_actor: &str,
    ) -> Result<AuditEvent, ApprovalError> {
        let mut plane = self.inner.lock().await;
        plane.approve(intent_event_id, policy_event_id, approver_actor)
    }

    pub async fn deny(
        &self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
        reason: Option<&str>,
        approver_actor: &str,
    ) -> Result<AuditEvent, ApprovalError> {
        let mut plane = self.inner.lock().await;
        plane.deny(intent_event_id, policy_event_id, reason, approver_actor)
    }

    pub async fn latest_decision(&self, intent_event_id: Uuid) -> Option<(crate::types::Decision, Uuid)> {
        let plane = self.inner.lock().await;
        plane.latest_decision(intent_event_id)
    }

    pub async fn approval_state(
        &self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
    ) -> Result<ApprovalRecord, ApprovalError> {
        let plane = self.inner.lock().await;
        plane.approval_state(intent_event_id, policy_event_id)
    }

    pub async fn record_evidence(
        &self,
        actor_id: &str,
        packet: &EvidencePacket,
    ) -> Result<AuditEvent, LedgerError> {
        let mut plane = self.inner.lock().await;
        plane.record_evidence(actor_id, packet)
    }

    pub async fn verify(&self) -> ChainVerification {
        let plane = self.inner.lock().await;
        plane.verify()
    }

    pub async fn get_by_id(&self, id: Uuid) -> Option<AuditEvent> {
        let plane = self.inner.lock().await;
        plane.get_by_id(id)
    }
}
