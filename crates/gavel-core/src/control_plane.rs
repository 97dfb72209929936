// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The control plane — the top-level composition of the Ledger, the Policy
//! Engine, and the Approval Registry.
//!
//! [`ControlPlane`] owns a single [`Ledger`] and exposes the request-facing
//! operations the Gateway dispatches to: `propose`, `approve`, `deny`, plus
//! read-through accessors for chain verification and approval state. It
//! holds no HTTP concerns of its own — those belong to `gavel-server`.
//!
//! ## Evaluation order (`propose`)
//!
//! 1. Append `INBOUND_INTENT`.
//! 2. Run the Policy Engine — pure, no I/O.
//! 3. If the result is ESCALATED, peek the Approval Registry for a valid
//!    grant; if one exists, the decision upgrades to APPROVED for this
//!    response (violations and risk score are kept as originally computed).
//! 4. Append `POLICY_EVAL:{decision}` linking the intent.
//! 5. If a grant was found in step 3, consume it now, appending
//!    `APPROVAL_CONSUMED` — after `POLICY_EVAL:*`, preserving event order.
//!
//! There is no cross-step optimization and no step skipping; every `propose`
//! call produces at least two ledger events.

use serde_json::json;
use uuid::Uuid;

use crate::approval::{ApprovalRegistry, DEFAULT_APPROVAL_TTL_SECONDS};
use crate::error::{ApprovalError, ControlPlaneError, LedgerError};
use crate::ledger::Ledger;
use crate::policy::{self, POLICY_VERSION};
use crate::storage::LedgerStorage;
use crate::types::{
    event_kind, ApprovalRecord, AuditEvent, ChainVerification, Decision, EvidencePacket,
    ProposeOutcome,
};

/// Composes the Ledger, Policy Engine, and Approval Registry into the single
/// API the Gateway dispatches requests to.
pub struct ControlPlane<S: LedgerStorage> {
    ledger: Ledger<S>,
    approval_ttl_seconds: i64,
}

impl<S: LedgerStorage> ControlPlane<S> {
    pub fn new(storage: S) -> Self {
        Self::with_approval_ttl(storage, DEFAULT_APPROVAL_TTL_SECONDS)
    }

    pub fn with_approval_ttl(storage: S, approval_ttl_seconds: i64) -> Self {
        Self {
            ledger: Ledger::new(storage),
            approval_ttl_seconds,
        }
    }

    /// Evaluate and record a proposed action.
    pub fn propose(
        &mut self,
        actor_id: &str,
        action_type: &str,
        content: &str,
    ) -> Result<ProposeOutcome, ControlPlaneError> {
        let intent = self.ledger.append(
            actor_id,
            event_kind::INBOUND_INTENT,
            json!({ "action_type": action_type, "content": content }),
            POLICY_VERSION,
        )?;

        let outcome = policy::evaluate(action_type, content);
        let mut decision = outcome.decision;

        let pending_grant = if decision == Decision::Escalated {
            let registry = ApprovalRegistry::new(&mut self.ledger, self.approval_ttl_seconds);
            registry.find_valid_grant(actor_id, action_type, content)
        } else {
            None
        };

        if pending_grant.is_some() {
            decision = Decision::Approved;
        }

        let policy_event = self.ledger.append(
            actor_id,
            &event_kind::policy_eval(decision),
            json!({
                "intent_event_id": intent.id,
                "risk_score": outcome.risk_score,
                "violations": outcome.violations,
            }),
            POLICY_VERSION,
        )?;

        let mut approval_consumed = false;
        if let Some(grant) = pending_grant {
            let mut registry = ApprovalRegistry::new(&mut self.ledger, self.approval_ttl_seconds);
            registry.consume(&grant, intent.id, policy_event.id)?;
            approval_consumed = true;
        }

        Ok(ProposeOutcome {
            decision,
            risk_score: outcome.risk_score,
            intent_event_id: intent.id,
            policy_event_id: policy_event.id,
            violations: outcome.violations,
            approval_consumed,
        })
    }

    /// Grant a human approval for an escalated intent. Requires the caller
    /// to have already authenticated `approver_actor` against the bearer
    /// secret — this method trusts the identity it's given.
    pub fn approve(
        &mut self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
        approver_actor: &str,
    ) -> Result<AuditEvent, ApprovalError> {
        let mut registry = ApprovalRegistry::new(&mut self.ledger, self.approval_ttl_seconds);
        registry.grant(intent_event_id, policy_event_id, approver_actor)
    }

    /// Deny an escalated intent.
    pub fn deny(
        &mut self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
        reason: Option<&str>,
        approver_actor: &str,
    ) -> Result<AuditEvent, ApprovalError> {
        let mut registry = ApprovalRegistry::new(&mut self.ledger, self.approval_ttl_seconds);
        registry.deny(intent_event_id, policy_event_id, reason, approver_actor)
    }

    /// Append the outcome of a Blast Box run as an `EVIDENCE_PACKET` event.
    /// Called by the Gateway's `/execute` handler after the sandbox runtime
    /// returns; the packet's `evidence_hash` is computed by the caller (see
    /// `gavel-sandbox`) and carried verbatim, not recomputed here — the
    /// Ledger's job is to record it tamper-evidently, not to validate it.
    pub fn record_evidence(
        &mut self,
        actor_id: &str,
        packet: &EvidencePacket,
    ) -> Result<AuditEvent, LedgerError> {
        self.ledger.append(
            actor_id,
            event_kind::EVIDENCE_PACKET,
            serde_json::to_value(packet).expect("EvidencePacket always serializes"),
            POLICY_VERSION,
        )
    }

    /// The most recent `POLICY_EVAL:*` decision recorded against an intent,
    /// along with the id of the policy event that recorded it — the pair
    /// `execute`'s gate needs to then consult the Approval Registry. `None`
    /// if no such intent was ever proposed.
    pub fn latest_decision(&self, intent_event_id: Uuid) -> Option<(Decision, Uuid)> {
        self.ledger
            .storage()
            .all_ordered()
            .into_iter()
            .filter(|e| {
                e.intent_payload.get("intent_event_id").and_then(|v| v.as_str())
                    == Some(intent_event_id.to_string().as_str())
            })
            .filter_map(|e| {
                event_kind::parse_policy_eval(&e.action_type).map(|decision| (e.created_at, e.id, decision))
            })
            .max_by_key(|(created_at, id, _)| (*created_at, *id))
            .map(|(_, id, decision)| (decision, id))
    }

    /// Current standing of an escalated intent, for `execute`'s gate and for
    /// any out-of-band status query.
    pub fn approval_state(
        &self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
    ) -> Result<ApprovalRecord, ApprovalError> {
        crate::approval::project(&self.ledger, intent_event_id, policy_event_id)
    }

    /// Walk the full chain and report the first break, if any.
    pub fn verify(&self) -> ChainVerification {
        self.ledger.verify()
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<AuditEvent> {
        self.ledger.get_by_id(id)
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }
}
