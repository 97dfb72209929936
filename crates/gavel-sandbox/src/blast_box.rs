// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The Blast Box orchestrator: snapshot the workspace, run a command
//! through a [`SandboxRuntime`], diff the workspace, and hash the evidence.
//!
//! This is the only place `evidence_hash` is computed — callers (the
//! Gateway's `/execute` handler) get back a fully-formed
//! [`gavel_core::types::EvidencePacket`] ready to append to the Ledger via
//! `ControlPlane::record_evidence`.

use std::path::Path;
use std::time::Duration;

use gavel_core::hash::{canonical_json, sha256_hex};
use gavel_core::types::{EvidencePacket, SandboxEnvironment};
use serde_json::json;
use uuid::Uuid;

use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::runtime::SandboxRuntime;
use crate::workspace::WorkspaceSnapshot;

pub struct BlastBox {
    config: SandboxConfig,
}

impl BlastBox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Run `command` for `proposal_id` through `runtime`, producing a
    /// signed evidence packet. Returns [`SandboxError::Unavailable`] if the
    /// runtime cannot even start — per §4.5, no packet is produced in that
    /// case, since there is nothing to record.
    pub async fn execute(
        &self,
        runtime: &dyn SandboxRuntime,
        proposal_id: Uuid,
        command: &str,
    ) -> Result<EvidencePacket, SandboxError> {
        tracing::info!(%proposal_id, runtime = runtime.name(), "starting blast box run");
        let workspace = Path::new(&self.config.workspace);
        let before = WorkspaceSnapshot::capture(workspace)?;

        let running = runtime.start(command, workspace).await.map_err(|error| {
            tracing::error!(%proposal_id, %error, "sandbox runtime failed to start");
            error
        })?;
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let result = runtime.wait(running, timeout).await;
        if result.timed_out {
            tracing::warn!(%proposal_id, timeout_seconds = self.config.timeout_seconds, "blast box run timed out");
        }

        let after = WorkspaceSnapshot::capture(workspace)?;
        let workspace_diff = before.diff(&after);

        let environment = SandboxEnvironment {
            image: self.config.image.clone(),
            network_mode: "none".into(),
            memory_limit: self.config.memory_limit.clone(),
            cpu_limit: self.config.cpu_limit.clone(),
            timeout_seconds: self.config.timeout_seconds,
        };

        let evidence_hash = sha256_hex(
            canonical_json(&json!({
                "command": command,
                "exit_code": result.exit_code,
                "duration_ms": result.duration_ms,
                "stdout": result.stdout,
                "stderr": result.stderr,
                "timed_out": result.timed_out,
                "workspace_diff": workspace_diff,
                "environment": environment,
            }))
            .as_bytes(),
        );

        Ok(EvidencePacket {
            proposal_id,
            command: command.to_string(),
            exit_code: result.exit_code,
            duration_ms: result.duration_ms,
            stdout: result.stdout,
            stderr: result.stderr,
            timed_out: result.timed_out,
            workspace_diff,
            environment,
            evidence_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSandbox;

    fn config_at(workspace: &Path) -> SandboxConfig {
        SandboxConfig {
            workspace: workspace.to_string_lossy().into_owned(),
            timeout_seconds: 5,
            ..SandboxConfig::default()
        }
    }

    #[tokio::test]
    async fn execute_produces_packet_with_recomputable_hash() {
        let dir = tempfile::tempdir().unwrap();
        let blast_box = BlastBox::new(config_at(dir.path()));
        let sandbox = FakeSandbox::succeeding("ok");

        let packet = blast_box
            .execute(&sandbox, Uuid::new_v4(), "echo ok")
            .await
            .unwrap();

        assert_eq!(packet.exit_code, 0);
        assert!(!packet.timed_out);
        assert_eq!(packet.evidence_hash.len(), 64);

        let recomputed = sha256_hex(
            canonical_json(&json!({
                "command": packet.command,
                "exit_code": packet.exit_code,
                "duration_ms": packet.duration_ms,
                "stdout": packet.stdout,
                "stderr": packet.stderr,
                "timed_out": packet.timed_out,
                "workspace_diff": packet.workspace_diff,
                "environment": packet.environment,
            }))
            .as_bytes(),
        );
        assert_eq!(packet.evidence_hash, recomputed);
    }

    #[tokio::test]
    async fn execute_reports_workspace_diff() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path()).unwrap();
        // The fake sandbox never touches the filesystem, so the diff is
        // exercised against a file created out-of-band between snapshots
        // by mutating the directory while `execute` is paused — in this
        // synchronous fake path there is no mutation, so the diff is empty.
        let blast_box = BlastBox::new(config_at(dir.path()));
        let sandbox = FakeSandbox::succeeding("ok");

        let packet = blast_box
            .execute(&sandbox, Uuid::new_v4(), "echo ok")
            .await
            .unwrap();

        assert!(packet.workspace_diff.added.is_empty());
        assert!(packet.workspace_diff.modified.is_empty());
        assert!(packet.workspace_diff.deleted.is_empty());
    }

    #[tokio::test]
    async fn unavailable_runtime_surfaces_before_any_packet() {
        let dir = tempfile::tempdir().unwrap();
        let blast_box = BlastBox::new(config_at(dir.path()));
        let sandbox = FakeSandbox::unavailable();

        let result = blast_box.execute(&sandbox, Uuid::new_v4(), "echo ok").await;
        assert!(matches!(result, Err(SandboxError::Unavailable(_))));
    }

    #[tokio::test]
    async fn timed_out_run_still_produces_a_packet() {
        let dir = tempfile::tempdir().unwrap();
        let blast_box = BlastBox::new(config_at(dir.path()));
        let sandbox = FakeSandbox::timing_out();

        let packet = blast_box
            .execute(&sandbox, Uuid::new_v4(), "sleep 999")
            .await
            .unwrap();

        assert!(packet.timed_out);
        assert_eq!(packet.exit_code, -1);
    }
}
