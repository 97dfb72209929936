// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Gateway-facing error taxonomy.
//!
//! Wraps the typed errors surfaced by `gavel-core` and `gavel-sandbox` into
//! a single enum with an `IntoResponse` impl, so every handler can return
//! `Result<Json<T>, ApiError>` and let axum translate it into the right
//! status code and `{error, code, details}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use gavel_core::{ApprovalError, ControlPlaneError, LedgerError};
use gavel_sandbox::SandboxError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("policy denied")]
    PolicyDenied { violations: Value },

    #[error("approval required")]
    ApprovalRequired,

    #[error("no such proposal")]
    NotFound,

    #[error("intent already resolved")]
    AlreadyResolved,

    #[error("sandbox unavailable: {0}")]
    SandboxUnavailable(String),

    #[error("ledger immutability violation")]
    LedgerImmutabilityViolation,

    #[error("chain broken at {break_at}")]
    ChainBroken { break_at: String },

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", None),
            ApiError::PolicyDenied { violations } => {
                (StatusCode::FORBIDDEN, "POLICY_DENIED", Some(violations.clone()))
            }
            ApiError::ApprovalRequired => (StatusCode::ACCEPTED, "APPROVAL_REQUIRED", None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::AlreadyResolved => (StatusCode::CONFLICT, "APPROVAL_STATE", {
                Some(serde_json::json!({ "state": "ALREADY_RESOLVED" }))
            }),
            ApiError::SandboxUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SANDBOX_UNAVAILABLE", None)
            }
            ApiError::LedgerImmutabilityViolation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "LEDGER_IMMUTABILITY_VIOLATION",
                None,
            ),
            ApiError::ChainBroken { break_at } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CHAIN_BROKEN",
                Some(serde_json::json!({ "break_at": break_at })),
            ),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None),
        };

        if matches!(
            self,
            ApiError::LedgerImmutabilityViolation | ApiError::ChainBroken { .. } | ApiError::Internal(_)
        ) {
            tracing::error!(error = %self, "fatal gateway error");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ControlPlaneError> for ApiError {
    fn from(err: ControlPlaneError) -> Self {
        match err {
            ControlPlaneError::Ledger(e) => e.into(),
            ControlPlaneError::Approval(e) => e.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ImmutabilityViolation => ApiError::LedgerImmutabilityViolation,
            LedgerError::NotFound(_) => ApiError::NotFound,
            LedgerError::ChainSerializationConflict | LedgerError::Storage(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::NotFound => ApiError::NotFound,
            ApprovalError::AlreadyResolved => ApiError::AlreadyResolved,
            ApprovalError::Unauthenticated => ApiError::Unauthenticated,
            ApprovalError::Ledger(e) => e.into(),
        }
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::Unavailable(msg) => ApiError::SandboxUnavailable(msg),
            SandboxError::Workspace(e) => ApiError::Internal(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
