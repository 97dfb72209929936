// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

use thiserror::Error;

/// Errors surfaced by a [`crate::runtime::SandboxRuntime`] or the
/// [`crate::blast_box::BlastBox`] orchestrator above it.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The runtime could not launch a sandbox at all (container runtime
    /// down, workspace path invalid, resource exhaustion). Surfaced by the
    /// Gateway as `SANDBOX_UNAVAILABLE` / HTTP 503 — no `EVIDENCE_PACKET`
    /// event is written for this outcome.
    #[error("sandbox unavailable: {0}")]
    Unavailable(String),

    /// The workspace could not be snapshotted or diffed.
    #[error("workspace I/O error: {0}")]
    Workspace(#[from] std::io::Error),
}
