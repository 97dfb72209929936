// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The five Gateway endpoints. Each handler is a thin translation between
//! HTTP and the `ControlPlane`/`BlastBox` APIs — no business logic lives
//! here that isn't already in `gavel-core`/`gavel-sandbox`.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use gavel_core::types::{ChainVerification, Decision, EvidencePacket};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: String,
    pub uptime_seconds: i64,
    pub chain: ChainVerification,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let chain = state.control_plane.verify().await;
    Json(HealthResponse {
        status: "ok",
        service: "gavel",
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        chain,
    })
}

// ---------------------------------------------------------------------------
// POST /propose
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub actor_id: String,
    pub action_type: String,
    pub content: String,
}

pub async fn propose(
    State(state): State<AppState>,
    Json(req): Json<ProposeRequest>,
) -> ApiResult<Response> {
    if req.actor_id.trim().is_empty() || req.action_type.trim().is_empty() {
        return Err(ApiError::BadRequest("actor_id and action_type are required".into()));
    }
    if !state.identities.is_allowed(&req.actor_id) {
        return Err(ApiError::Unauthenticated);
    }

    let outcome = state
        .control_plane
        .propose(&req.actor_id, &req.action_type, &req.content)
        .await?;

    let status = match outcome.decision {
        Decision::Approved => StatusCode::OK,
        Decision::Escalated => StatusCode::ACCEPTED,
        Decision::Denied => StatusCode::FORBIDDEN,
    };

    Ok((status, Json(outcome)).into_response())
}

// ---------------------------------------------------------------------------
// POST /execute
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub proposal_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub evidence_event_id: Uuid,
    pub evidence_packet: EvidencePacket,
}

pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> ApiResult<Response> {
    let intent = state
        .control_plane
        .get_by_id(req.proposal_id)
        .await
        .ok_or(ApiError::NotFound)?;

    let (decision, policy_event_id) = state
        .control_plane
        .latest_decision(req.proposal_id)
        .await
        .ok_or(ApiError::NotFound)?;

    match decision {
        Decision::Denied => {
            let violations = state
                .control_plane
                .get_by_id(policy_event_id)
                .await
                .map(|e| e.intent_payload.get("violations").cloned().unwrap_or(json!([])))
                .unwrap_or(json!([]));
            return Err(ApiError::PolicyDenied { violations });
        }
        Decision::Escalated => return Err(ApiError::ApprovalRequired),
        Decision::Approved => {}
    }

    let command = intent
        .intent_payload
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let packet = state
        .blast_box
        .execute(state.sandbox_runtime.as_ref(), req.proposal_id, command)
        .await?;

    let evidence_event = state
        .control_plane
        .record_evidence("system:blastbox", &packet)
        .await?;

    Ok(Json(ExecuteResponse {
        evidence_event_id: evidence_event.id,
        evidence_packet: packet,
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// POST /approve, POST /deny
// ---------------------------------------------------------------------------

/// The shared bearer secret authenticates the Gateway's approval surface as
/// a whole, not an individual operator (see the Non-goal on per-approver
/// signing) — every grant/denial is attributed to this actor id.
const OPERATOR_ACTOR: &str = "human:operator";

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub intent_event_id: Uuid,
    pub policy_event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub ok: bool,
    pub approval_event_id: Uuid,
}

pub async fn approve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ApproveRequest>,
) -> ApiResult<Json<ApproveResponse>> {
    require_bearer(&state, &headers)?;

    let event = state
        .control_plane
        .approve(req.intent_event_id, req.policy_event_id, OPERATOR_ACTOR)
        .await?;

    Ok(Json(ApproveResponse {
        ok: true,
        approval_event_id: event.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DenyRequest {
    pub intent_event_id: Uuid,
    pub policy_event_id: Uuid,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DenyResponse {
    pub ok: bool,
    pub denial_event_id: Uuid,
}

pub async fn deny(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DenyRequest>,
) -> ApiResult<Json<DenyResponse>> {
    require_bearer(&state, &headers)?;

    let event = state
        .control_plane
        .deny(req.intent_event_id, req.policy_event_id, req.reason.as_deref(), OPERATOR_ACTOR)
        .await?;

    Ok(Json(DenyResponse {
        ok: true,
        denial_event_id: event.id,
    }))
}

fn require_bearer(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if state.authenticate_bearer(header) {
        Ok(())
    } else {
        Err(ApiError::Unauthenticated)
    }
}
