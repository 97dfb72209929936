// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # gavel-core
//!
//! Hash-chained ledger, deterministic policy engine, and approval registry
//! for the gavel governance control plane — the layer that sits between
//! autonomous agents and the side-effecting actions they propose.
//!
//! ## Architecture
//!
//! ```text
//! ControlPlane<S: LedgerStorage>
//!   ├── Ledger<S>           — append-only, hash-chained event log
//!   ├── policy::evaluate    — pure (action_type, content) -> PolicyOutcome
//!   └── ApprovalRegistry    — read-through state machine over Ledger events
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use gavel_core::{control_plane::ControlPlane, storage::InMemoryStorage, types::Decision};
//!
//! let mut plane = ControlPlane::new(InMemoryStorage::new());
//!
//! let outcome = plane.propose("agent:coder", "file_read", "src/main.rs").unwrap();
//! assert_eq!(outcome.decision, Decision::Approved);
//! assert!(plane.verify().chain_valid);
//! ```

pub mod approval;
pub mod control_plane;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod policy;
pub mod storage;
pub mod types;

// Async control plane — only compiled when the "async" feature is enabled.
#[cfg(feature = "async")]
pub mod async_control_plane;

// Re-export the most commonly used items at the crate root so consumers can
// write `use gavel_core::ControlPlane;` instead of the fully qualified path.
pub use control_plane::ControlPlane;
pub use error::{ApprovalError, ControlPlaneError, LedgerError};
pub use ledger::Ledger;
pub use storage::{InMemoryStorage, LedgerStorage};
pub use types::{
    ApprovalRecord, ApprovalState, AuditEvent, AuditFilter, ChainVerification, Decision,
    EvidencePacket, PolicyOutcome, ProposeOutcome, SandboxEnvironment, Violation, WorkspaceDiff,
};

// Re-export the async control plane at the crate root for ergonomic imports.
#[cfg(feature = "async")]
pub use async_control_plane::AsyncControlPlane;

// Full three-layer configuration loading (defaults -> TOML -> env) is owned
// by gavel-server's GatewayConfig, not this crate — see its config module.
