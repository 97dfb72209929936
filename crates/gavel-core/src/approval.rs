// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The Approval Registry.
//!
//! A pure projection over [`crate::ledger::Ledger`] events — it owns no
//! storage of its own. Every operation either reads the existing event
//! sequence to derive an [`ApprovalRecord`], or appends a new event and lets
//! a later projection observe it.
//!
//! Payload conventions shared with [`crate::control_plane`]:
//!
//! * `INBOUND_INTENT` → `{action_type, content}`
//! * `POLICY_EVAL:*` → `{intent_event_id, risk_score, violations}`
//! * `HUMAN_APPROVAL_GRANTED` → `{intent_event_id, policy_event_id, actor_id, action_type, content}`
//! * `HUMAN_DENIAL` → `{intent_event_id, policy_event_id, reason}`
//! * `APPROVAL_CONSUMED` → `{grant_event_id, new_intent_event_id, new_policy_event_id}`
//! * `AUTO_DENIED_TIMEOUT` → `{intent_event_id, policy_event_id}`

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApprovalError;
use crate::ledger::Ledger;
use crate::policy::POLICY_VERSION;
use crate::storage::LedgerStorage;
use crate::types::{event_kind, ApprovalRecord, ApprovalState, AuditEvent};

/// Below this many elapsed seconds since escalation, an intent sits in
/// `PENDING_REVIEW`.
pub const HUMAN_REQUIRED_AFTER_SECS: i64 = 300;

/// Past this many elapsed seconds with no resolution, an intent is
/// considered timed out.
pub const AUTO_DENY_AFTER_SECS: i64 = 3600;

/// Default lifetime of a granted approval, from `APPROVAL_TTL_SECONDS`.
pub const DEFAULT_APPROVAL_TTL_SECONDS: i64 = 3600;

/// Read-through view and mutator over escalated intents.
///
/// Holds the ledger mutably because `grant`/`deny`/`consume_if_valid` append
/// events; `project` only reads. There is deliberately no cache — every call
/// re-derives its answer from `storage().all_ordered()`, which keeps this
/// type trivially correct at the cost of an O(n) scan per call. At the
/// human-in-the-loop request rates this system targets, that's the right
/// trade.
pub struct ApprovalRegistry<'a, S: LedgerStorage> {
    ledger: &'a mut Ledger<S>,
    ttl_seconds: i64,
}

impl<'a, S: LedgerStorage> ApprovalRegistry<'a, S> {
    pub fn new(ledger: &'a mut Ledger<S>, ttl_seconds: i64) -> Self {
        Self { ledger, ttl_seconds }
    }

    fn events(&self) -> Vec<AuditEvent> {
        self.ledger.storage().all_ordered()
    }

    /// Derive the current [`ApprovalRecord`] for an escalated intent.
    ///
    /// `policy_event_id` anchors the escalation clock: elapsed time is
    /// measured from that event's `created_at`. Thin wrapper over
    /// [`project`], which only needs shared access to the ledger — callers
    /// holding just `&Ledger<S>` (e.g. [`crate::control_plane::ControlPlane::approval_state`])
    /// can call that directly without a registry.
    pub fn project(
        &self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
    ) -> Result<ApprovalRecord, ApprovalError> {
        project(self.ledger, intent_event_id, policy_event_id)
    }

    /// Grant a human approval for an escalated intent.
    pub fn grant(
        &mut self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
        approver_actor: &str,
    ) -> Result<AuditEvent, ApprovalError> {
        let record = self.project(intent_event_id, policy_event_id)?;
        if !matches!(
            record.state,
            ApprovalState::PendingReview | ApprovalState::HumanRequired
        ) {
            return Err(ApprovalError::AlreadyResolved);
        }

        let intent = self
            .ledger
            .get_by_id(intent_event_id)
            .ok_or(ApprovalError::NotFound)?;
        let action_type = action_type_of(&intent);
        let content = content_of(&intent);

        let payload = json!({
            "intent_event_id": intent_event_id,
            "policy_event_id": policy_event_id,
            "actor_id": intent.actor_id,
            "action_type": action_type,
            "content": content,
        });

        self.ledger
            .append(
                approver_actor,
                event_kind::HUMAN_APPROVAL_GRANTED,
                payload,
                POLICY_VERSION,
            )
            .map_err(ApprovalError::from)
    }

    /// Deny an escalated intent. `HUMAN_DENIAL` is exclusive — it blocks any
    /// later consumption for the same intent (A4).
    pub fn deny(
        &mut self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
        reason: Option<&str>,
        approver_actor: &str,
    ) -> Result<AuditEvent, ApprovalError> {
        let record = self.project(intent_event_id, policy_event_id)?;
        if !matches!(
            record.state,
            ApprovalState::PendingReview | ApprovalState::HumanRequired
        ) {
            return Err(ApprovalError::AlreadyResolved);
        }

        let payload = json!({
            "intent_event_id": intent_event_id,
            "policy_event_id": policy_event_id,
            "reason": reason,
        });

        self.ledger
            .append(
                approver_actor,
                event_kind::HUMAN_DENIAL,
                payload,
                POLICY_VERSION,
            )
            .map_err(ApprovalError::from)
    }

    /// Materialize an `AUTO_DENIED_TIMEOUT` event for an intent that has
    /// exceeded the timeout window and has no resolution yet. Idempotent:
    /// calling this twice for the same intent only writes one event, since
    /// the second call observes `project()` already reporting
    /// `AutoDeniedTimeout` via the first call's own event and returns `Ok(None)`.
    ///
    /// Intended for a periodic reaper or for `health` to call lazily; no
    /// code path requires it to run before `grant`/`deny` correctly refuse a
    /// stale intent, since `project` computes the timeout state whether or
    /// not it has been written down.
    pub fn mark_timed_out(
        &mut self,
        intent_event_id: Uuid,
        policy_event_id: Uuid,
    ) -> Result<Option<AuditEvent>, ApprovalError> {
        let record = self.project(intent_event_id, policy_event_id)?;
        if record.state != ApprovalState::AutoDeniedTimeout {
            return Ok(None);
        }
        if self.events().iter().any(|e| {
            e.action_type == event_kind::AUTO_DENIED_TIMEOUT
                && references_intent(e, intent_event_id)
        }) {
            return Ok(None);
        }

        let payload = json!({
            "intent_event_id": intent_event_id,
            "policy_event_id": policy_event_id,
        });
        let event = self.ledger.append(
            "system:reaper",
            event_kind::AUTO_DENIED_TIMEOUT,
            payload,
            POLICY_VERSION,
        )?;
        Ok(Some(event))
    }

    /// Look for the newest unconsumed, undenied, unexpired grant matching
    /// `(actor_id, action_type, content)` and, if found, consume it on
    /// behalf of `new_intent_event_id`/`new_policy_event_id`.
    ///
    /// `content` is trimmed before comparison per the approval fingerprint
    /// rule; no other field of the payload participates.
    pub fn consume_if_valid(
        &mut self,
        actor_id: &str,
        action_type: &str,
        content: &str,
        new_intent_event_id: Uuid,
        new_policy_event_id: Uuid,
    ) -> Result<Option<AuditEvent>, ApprovalError> {
        match self.find_valid_grant(actor_id, action_type, content) {
            Some(grant) => self
                .consume(&grant, new_intent_event_id, new_policy_event_id)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Read-only half of [`consume_if_valid`]: find the newest matching
    /// grant without appending anything. Used by the Gateway's `propose`
    /// orchestration, which must know the upgraded decision *before* it
    /// writes `POLICY_EVAL:*` — consumption itself happens afterward via
    /// [`consume`](Self::consume), preserving the
    /// `INBOUND_INTENT → POLICY_EVAL:* → APPROVAL_CONSUMED` event order.
    pub fn find_valid_grant(&self, actor_id: &str, action_type: &str, content: &str) -> Option<AuditEvent> {
        let fingerprint_content = content.trim();
        let now = Utc::now();
        let ttl = Duration::seconds(self.ttl_seconds);
        let events = self.events();

        let mut candidates: Vec<&AuditEvent> = events
            .iter()
            .filter(|e| e.action_type == event_kind::HUMAN_APPROVAL_GRANTED)
            .filter(|e| grant_matches_fingerprint(e, actor_id, action_type, fingerprint_content))
            .filter(|e| !grant_is_consumed(&events, e.id))
            .filter(|e| !grant_intent_is_denied(&events, e))
            .filter(|e| now.signed_duration_since(e.created_at) < ttl)
            .collect();

        candidates.sort_by_key(|e| (e.created_at, e.id));
        candidates.pop().cloned()
    }

    /// Append `APPROVAL_CONSUMED` for a grant already found valid by
    /// [`find_valid_grant`]. Re-checks one-shot consumption and denial
    /// exclusivity at call time — the peek/consume split creates a window
    /// where a concurrent request could have consumed or denied the same
    /// grant in between, and this guards it the same way `grant`/`deny`
    /// guard against a stale `project` read.
    pub fn consume(
        &mut self,
        grant: &AuditEvent,
        new_intent_event_id: Uuid,
        new_policy_event_id: Uuid,
    ) -> Result<AuditEvent, ApprovalError> {
        let events = self.events();
        if grant_is_consumed(&events, grant.id) {
            return Err(ApprovalError::AlreadyResolved);
        }
        if grant_intent_is_denied(&events, grant) {
            return Err(ApprovalError::AlreadyResolved);
        }

        let payload = json!({
            "grant_event_id": grant.id,
            "new_intent_event_id": new_intent_event_id,
            "new_policy_event_id": new_policy_event_id,
        });

        self.ledger
            .append(
                &grant
                    .intent_payload
                    .get("actor_id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                event_kind::APPROVAL_CONSUMED,
                payload,
                POLICY_VERSION,
            )
            .map_err(ApprovalError::from)
    }
}

/// Derive the current [`ApprovalRecord`] for an escalated intent directly
/// from a ledger handle, with no [`ApprovalRegistry`] construction required.
pub fn project<S: LedgerStorage>(
    ledger: &Ledger<S>,
    intent_event_id: Uuid,
    policy_event_id: Uuid,
) -> Result<ApprovalRecord, ApprovalError> {
    let policy_event = ledger.get_by_id(policy_event_id).ok_or(ApprovalError::NotFound)?;
    let intent_event = ledger.get_by_id(intent_event_id).ok_or(ApprovalError::NotFound)?;
    let events = ledger.storage().all_ordered();

    if let Some(consumed) = events.iter().find(|e| {
        e.action_type == event_kind::APPROVAL_CONSUMED
            && grant_of_consumption_matches_intent(&events, e, intent_event_id)
    }) {
        return Ok(ApprovalRecord {
            intent_event_id,
            policy_event_id,
            actor_id: intent_event.actor_id.clone(),
            state: ApprovalState::Resolved,
            granted_at: None,
            grant_event_id: consumed
                .intent_payload
                .get("grant_event_id")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok()),
        });
    }

    if events
        .iter()
        .any(|e| e.action_type == event_kind::HUMAN_DENIAL && references_intent(e, intent_event_id))
    {
        return Ok(ApprovalRecord {
            intent_event_id,
            policy_event_id,
            actor_id: intent_event.actor_id.clone(),
            state: ApprovalState::Resolved,
            granted_at: None,
            grant_event_id: None,
        });
    }

    if events.iter().any(|e| {
        e.action_type == event_kind::AUTO_DENIED_TIMEOUT && references_intent(e, intent_event_id)
    }) {
        return Ok(ApprovalRecord {
            intent_event_id,
            policy_event_id,
            actor_id: intent_event.actor_id.clone(),
            state: ApprovalState::AutoDeniedTimeout,
            granted_at: None,
            grant_event_id: None,
        });
    }

    if let Some(grant) = events.iter().find(|e| {
        e.action_type == event_kind::HUMAN_APPROVAL_GRANTED && references_intent(e, intent_event_id)
    }) {
        return Ok(ApprovalRecord {
            intent_event_id,
            policy_event_id,
            actor_id: intent_event.actor_id.clone(),
            state: ApprovalState::Resolved,
            granted_at: Some(grant.created_at),
            grant_event_id: Some(grant.id),
        });
    }

    let elapsed = Utc::now().signed_duration_since(policy_event.created_at);
    let state = if elapsed > Duration::seconds(AUTO_DENY_AFTER_SECS) {
        ApprovalState::AutoDeniedTimeout
    } else if elapsed >= Duration::seconds(HUMAN_REQUIRED_AFTER_SECS) {
        ApprovalState::HumanRequired
    } else {
        ApprovalState::PendingReview
    };

    Ok(ApprovalRecord {
        intent_event_id,
        policy_event_id,
        actor_id: intent_event.actor_id,
        state,
        granted_at: None,
        grant_event_id: None,
    })
}

fn content_of(intent: &AuditEvent) -> String {
    intent
        .intent_payload
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// The real `action_type` a proposal was evaluated under, read from the
/// `INBOUND_INTENT` payload — not `AuditEvent.action_type`, which is always
/// the literal `"INBOUND_INTENT"` event-kind discriminator.
fn action_type_of(intent: &AuditEvent) -> String {
    intent
        .intent_payload
        .get("action_type")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn references_intent(event: &AuditEvent, intent_event_id: Uuid) -> bool {
    event
        .intent_payload
        .get("intent_event_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(|id| id == intent_event_id)
        .unwrap_or(false)
}

fn grant_of_consumption_matches_intent(
    events: &[AuditEvent],
    consumption: &AuditEvent,
    intent_event_id: Uuid,
) -> bool {
    let grant_id = match consumption
        .intent_payload
        .get("grant_event_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        Some(id) => id,
        None => return false,
    };
    events
        .iter()
        .find(|e| e.id == grant_id)
        .map(|grant| references_intent(grant, intent_event_id))
        .unwrap_or(false)
}

fn grant_matches_fingerprint(grant: &AuditEvent, actor_id: &str, action_type: &str, content: &str) -> bool {
    let payload = &grant.intent_payload;
    payload.get("actor_id").and_then(|v| v.as_str()) == Some(actor_id)
        && payload.get("action_type").and_then(|v| v.as_str()) == Some(action_type)
        && payload
            .get("content")
            .and_then(|v| v.as_str())
            .map(str::trim)
            == Some(content)
}

fn grant_is_consumed(events: &[AuditEvent], grant_event_id: Uuid) -> bool {
    events.iter().any(|e| {
        e.action_type == event_kind::APPROVAL_CONSUMED
            && e.intent_payload
                .get("grant_event_id")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok())
                == Some(grant_event_id)
    })
}

fn grant_intent_is_denied(events: &[AuditEvent], grant: &AuditEvent) -> bool {
    let intent_id = match grant
        .intent_payload
        .get("intent_event_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        Some(id) => id,
        None => return false,
    };
    events
        .iter()
        .any(|e| e.action_type == event_kind::HUMAN_DENIAL && references_intent(e, intent_id))
}
