// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! # gavel-sandbox
//!
//! The Blast Box: isolated command execution for approved proposals, with
//! workspace diffing and evidence hashing so a third party can
//! independently recompute what a run actually did.
//!
//! ```text
//! BlastBox
//!   ├── SandboxRuntime   — start/wait a command (TokioSandbox in prod, FakeSandbox in tests)
//!   └── WorkspaceSnapshot — before/after file hashes, diffed into WorkspaceDiff
//! ```

pub mod blast_box;
pub mod config;
pub mod error;
pub mod fake;
pub mod runtime;
pub mod workspace;

pub use blast_box::BlastBox;
pub use config::SandboxConfig;
pub use error::SandboxError;
pub use fake::FakeSandbox;
pub use runtime::{RunningSandbox, SandboxRuntime, SandboxWaitResult, TokioSandbox};
pub use workspace::WorkspaceSnapshot;
