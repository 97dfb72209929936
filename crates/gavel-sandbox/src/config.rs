// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! Resource knobs for the Blast Box, set from the `BLAST_BOX_*` environment
//! variables (or a `[blast_box]` TOML table) by `gavel-server`'s
//! `GatewayConfig`. This crate only consumes the final values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub image: String,
    pub memory_limit: String,
    pub cpu_limit: String,
    pub timeout_seconds: u64,
    pub workspace: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: "gavel-blastbox:latest".into(),
            memory_limit: "512m".into(),
            cpu_limit: "1".into(),
            timeout_seconds: 60,
            workspace: "/tmp/gavel-blastbox".into(),
        }
    }
}
