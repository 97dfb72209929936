// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Error taxonomy for the ledger and approval registry.
//!
//! The Gateway crate wraps these into its own `ApiError` for HTTP
//! translation; these types carry no HTTP concerns of their own.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by [`crate::ledger::Ledger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The underlying store could not serialize two concurrent appends.
    /// The caller should retry.
    #[error("chain serialization conflict, retry the append")]
    ChainSerializationConflict,

    /// The storage layer rejected a mutation of an existing row. This should
    /// never happen through the `Ledger` API itself — it indicates either a
    /// bug or an out-of-band write against the backing store.
    #[error("attempted mutation of an immutable ledger row")]
    ImmutabilityViolation,

    /// No event exists with the given id.
    #[error("no ledger event with id {0}")]
    NotFound(Uuid),

    /// Opaque storage-layer failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors surfaced by [`crate::approval::ApprovalRegistry`].
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("no such intent")]
    NotFound,

    #[error("intent already resolved")]
    AlreadyResolved,

    #[error("approver is not authenticated")]
    Unauthenticated,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors surfaced by [`crate::control_plane::ControlPlane`], which
/// orchestrates the Ledger and the Approval Registry and so can fail in
/// either's terms.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),
}
