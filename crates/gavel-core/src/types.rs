// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Shared data types used across all governance sub-systems.
//!
//! All types implement [`Clone`], [`Debug`], [`serde::Serialize`], and
//! [`serde::Deserialize`] so they can be serialised to JSON, stored, and
//! transmitted across the wire without additional conversion steps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The three-way verdict produced by the policy engine for a proposed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approved,
    Denied,
    Escalated,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Approved => "APPROVED",
            Decision::Denied => "DENIED",
            Decision::Escalated => "ESCALATED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(Decision::Approved),
            "DENIED" => Ok(Decision::Denied),
            "ESCALATED" => Ok(Decision::Escalated),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Action type vocabulary
// ---------------------------------------------------------------------------

/// The closed vocabulary of `action_type` values a ledger event may carry.
///
/// Stored on [`AuditEvent`] as plain text so the ledger itself stays
/// agnostic of the vocabulary; this module is the single place new event
/// kinds are named.
pub mod event_kind {
    use super::Decision;

    pub const INBOUND_INTENT: &str = "INBOUND_INTENT";
    pub const HUMAN_APPROVAL_GRANTED: &str = "HUMAN_APPROVAL_GRANTED";
    pub const HUMAN_DENIAL: &str = "HUMAN_DENIAL";
    pub const APPROVAL_CONSUMED: &str = "APPROVAL_CONSUMED";
    pub const AUTO_DENIED_TIMEOUT: &str = "AUTO_DENIED_TIMEOUT";
    pub const EVIDENCE_PACKET: &str = "EVIDENCE_PACKET";

    /// Build the `POLICY_EVAL:{decision}` action type for a given decision.
    pub fn policy_eval(decision: Decision) -> String {
        format!("POLICY_EVAL:{decision}")
    }

    /// Parse a `POLICY_EVAL:{decision}` action type back into a [`Decision`].
    pub fn parse_policy_eval(action_type: &str) -> Option<Decision> {
        action_type
            .strip_prefix("POLICY_EVAL:")
            .and_then(|rest| rest.parse().ok())
    }
}

// ---------------------------------------------------------------------------
// Audit Spine
// ---------------------------------------------------------------------------

/// Atomic unit of the hash-chained audit spine.
///
/// `event_hash` and `previous_event_hash` are hex-encoded SHA-256 digests;
/// `previous_event_hash` is the literal sentinel `"GENESIS"` for the first
/// event ever appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub actor_id: String,
    pub action_type: String,
    pub intent_payload: serde_json::Value,
    pub policy_version: String,
    pub event_hash: String,
    pub previous_event_hash: String,
}

/// Sentinel predecessor hash of the very first event in a chain.
pub const GENESIS: &str = "GENESIS";

/// Filter used to narrow the results of [`crate::ledger::Ledger::list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    pub actor_id: Option<String>,
    pub action_type: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

/// Result of [`crate::ledger::Ledger::verify`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerification {
    pub total_events: usize,
    pub chain_valid: bool,
    pub break_at: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// A single policy rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine-readable rule code, e.g. `NO_SUDO`.
    pub rule: String,
    /// Human-readable explanation of why the rule fired.
    pub description: String,
}

impl Violation {
    pub fn new(rule: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            description: description.into(),
        }
    }
}

/// The pure result of [`crate::policy::evaluate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOutcome {
    pub decision: Decision,
    pub risk_score: f64,
    pub violations: Vec<Violation>,
}

/// Response shape of [`crate::control_plane::ControlPlane::propose`] — also
/// the JSON body the Gateway's `POST /propose` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeOutcome {
    pub decision: Decision,
    pub risk_score: f64,
    pub intent_event_id: Uuid,
    pub policy_event_id: Uuid,
    pub violations: Vec<Violation>,
    /// `true` when this outcome reflects an ESCALATED→APPROVED upgrade via a
    /// prior human grant, rather than a direct policy decision.
    pub approval_consumed: bool,
}

// ---------------------------------------------------------------------------
// Approval lifecycle
// ---------------------------------------------------------------------------

/// State of an escalated intent as projected from the ledger at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalState {
    PendingReview,
    HumanRequired,
    Resolved,
    AutoDeniedTimeout,
}

/// A derived view over the spine: the current standing of one escalated
/// intent. Not a separate table — reconstructed from ledger events on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub intent_event_id: Uuid,
    pub policy_event_id: Uuid,
    pub actor_id: String,
    pub state: ApprovalState,
    pub granted_at: Option<DateTime<Utc>>,
    pub grant_event_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Blast Box / Evidence
// ---------------------------------------------------------------------------

/// Paths added, modified, or deleted by a sandboxed execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceDiff {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

/// The resource envelope a sandboxed command actually ran under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxEnvironment {
    pub image: String,
    pub network_mode: String,
    pub memory_limit: String,
    pub cpu_limit: String,
    pub timeout_seconds: u64,
}

/// Payload of an `EVIDENCE_PACKET` event: everything needed to independently
/// recompute `evidence_hash` and audit what a Blast Box run actually did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePacket {
    pub proposal_id: Uuid,
    pub command: String,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub workspace_diff: WorkspaceDiff,
    pub environment: SandboxEnvironment,
    pub evidence_hash: String,
}
