// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # gavel-storage
//!
//! Durable [`gavel_core::storage::LedgerStorage`] implementations for the
//! gavel governance control plane. `gavel-core` ships only
//! [`gavel_core::storage::InMemoryStorage`] so it stays free of any
//! particular persistence dependency; this crate supplies the backends a
//! real deployment runs against.
//!
//! - [`FileStorage`] (feature `file`, default) — single-process, JSON
//!   file-backed. Suitable for a development server or a small single-node
//!   deployment.
//! - [`SqlStorage`] (feature `sql`) — `sqlx`/SQLite-backed, with row-level
//!   triggers enforcing append-only semantics and a unique index on
//!   `previous_event_hash` enforcing the no-branching invariant.

#[cfg(feature = "file")]
pub mod file;
#[cfg(feature = "sql")]
pub mod sql;

#[cfg(feature = "file")]
pub use file::FileStorage;
#[cfg(feature = "sql")]
pub use sql::SqlStorage;
