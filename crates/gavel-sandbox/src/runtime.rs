// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! The `SandboxRuntime` trait and its real, process-backed implementation.
//!
//! The runtime sits behind a trait (`start`, `wait`, `kill`) so the real
//! [`TokioSandbox`] can be swapped for [`crate::fake::FakeSandbox`] in
//! tests, exactly as sandbox compilation is abstracted behind a trait
//! elsewhere in this codebase's lineage.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::error::SandboxError;

/// Outcome of letting a started sandbox run to completion or to its
/// deadline.
#[derive(Debug, Clone)]
pub struct SandboxWaitResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    pub timed_out: bool,
}

/// A sandbox that has been started and not yet waited on. Concrete rather
/// than an associated type so `Box<dyn SandboxRuntime>` stays usable —
/// there are exactly two variants: a real OS process, and the fake used in
/// tests.
pub enum RunningSandbox {
    Process { child: Child, started_at: Instant },
    Simulated(crate::fake::SimulatedRun),
}

/// Isolated command execution. Implementations isolate network, filesystem,
/// and resource access; this crate does not itself provide the isolation
/// mechanism (container runtime, VM, etc.) — `TokioSandbox` is the
/// process-level baseline a deployment wraps with its own container
/// tooling by pointing `command` at `docker run` or equivalent.
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Launch `command` with its working directory set to `workspace`.
    async fn start(&self, command: &str, workspace: &Path) -> Result<RunningSandbox, SandboxError>;

    /// Wait for `running` to exit, killing it if `timeout` elapses first.
    async fn wait(&self, running: RunningSandbox, timeout: Duration) -> SandboxWaitResult;

    fn name(&self) -> &str;
}

/// `tokio::process::Command`-backed [`SandboxRuntime`].
///
/// Isolation at this layer is process-level only (no network namespace, no
/// filesystem jail) — a production deployment runs `command` as an
/// invocation of its own container runtime (e.g. `docker run --network
/// none ...`) so the isolation properties §4.5 requires are provided by
/// that wrapper, not reimplemented here.
pub struct TokioSandbox;

impl TokioSandbox {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SandboxRuntime for TokioSandbox {
    async fn start(&self, command: &str, workspace: &Path) -> Result<RunningSandbox, SandboxError> {
        std::fs::create_dir_all(workspace)?;

        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .current_dir(workspace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Unavailable(e.to_string()))?;

        Ok(RunningSandbox::Process {
            child,
            started_at: Instant::now(),
        })
    }

    async fn wait(&self, running: RunningSandbox, timeout: Duration) -> SandboxWaitResult {
        match running {
            RunningSandbox::Process { mut child, started_at } => {
                let mut stdout_buf = Vec::new();
                let mut stderr_buf = Vec::new();
                if let Some(mut out) = child.stdout.take() {
                    let _ = out.read_to_end(&mut stdout_buf).await;
                }
                if let Some(mut err) = child.stderr.take() {
                    let _ = err.read_to_end(&mut stderr_buf).await;
                }

                let wait_result = tokio::time::timeout(timeout, child.wait()).await;
                let duration_ms = started_at.elapsed().as_millis() as u64;

                match wait_result {
                    Ok(Ok(status)) => SandboxWaitResult {
                        exit_code: status.code().unwrap_or(-1),
                        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
                        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                        duration_ms,
                        timed_out: false,
                    },
                    Ok(Err(_)) => SandboxWaitResult {
                        exit_code: -1,
                        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
                        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                        duration_ms,
                        timed_out: false,
                    },
                    Err(_elapsed) => {
                        // kill_on_drop(true) reaps the process once `child`
                        // drops at the end of this match arm.
                        SandboxWaitResult {
                            exit_code: -1,
                            stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
                            stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
                            duration_ms,
                            timed_out: true,
                        }
                    }
                }
            }
            RunningSandbox::Simulated(run) => run.into_wait_result(),
        }
    }

    fn name(&self) -> &str {
        "tokio-process-sandbox"
    }
}

/// Default Blast Box workspace mount point when `BLAST_BOX_WORKSPACE` is
/// unset.
pub fn default_workspace_root() -> PathBuf {
    PathBuf::from("/tmp/gavel-blastbox")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_command_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = TokioSandbox::new();
        let running = sandbox.start("echo hello", dir.path()).await.unwrap();
        let result = sandbox.wait(running, Duration::from_secs(5)).await;

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout.trim(), "hello");
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn nonzero_exit_is_captured_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = TokioSandbox::new();
        let running = sandbox.start("exit 7", dir.path()).await.unwrap();
        let result = sandbox.wait(running, Duration::from_secs(5)).await;

        assert_eq!(result.exit_code, 7);
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = TokioSandbox::new();
        let running = sandbox.start("sleep 30", dir.path()).await.unwrap();
        let result = sandbox.wait(running, Duration::from_millis(100)).await;

        assert!(result.timed_out);
        assert_eq!(result.exit_code, -1);
    }
}
