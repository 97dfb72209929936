// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # gavel-server
//!
//! The Gateway: an `axum` HTTP surface over `gavel-core`'s `ControlPlane`
//! and `gavel-sandbox`'s `BlastBox`.
//!
//! ```text
//! Router
//!   ├── GET  /health    — chain verification summary
//!   ├── POST /propose   — evaluate and record a proposed action
//!   ├── POST /execute   — run an approved action through the Blast Box
//!   ├── POST /approve   — human grant for an escalated intent (bearer)
//!   └── POST /deny      — human denial (bearer)
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod identities;
pub mod router;
pub mod state;
