// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 MuVeraAI Corporation

//! An in-process, configurable [`crate::runtime::SandboxRuntime`] for
//! deterministic tests — no process is ever spawned.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SandboxError;
use crate::runtime::{RunningSandbox, SandboxRuntime, SandboxWaitResult};

/// The canned result a [`FakeSandbox`] will hand back from `wait`.
#[derive(Debug, Clone)]
pub struct SimulatedRun {
    exit_code: i32,
    stdout: String,
    stderr: String,
    timed_out: bool,
}

impl SimulatedRun {
    pub(crate) fn into_wait_result(self) -> SandboxWaitResult {
        SandboxWaitResult {
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
            duration_ms: 1,
            timed_out: self.timed_out,
        }
    }
}

/// A [`SandboxRuntime`] that never touches the OS. Each instance is
/// configured with the single outcome it will produce, mirroring the
/// per-stage configurability of this codebase's other simulated
/// compiler/runtime fakes.
pub struct FakeSandbox {
    run: SimulatedRun,
    unavailable: bool,
}

impl FakeSandbox {
    /// Succeeds with exit code 0 and the given stdout.
    pub fn succeeding(stdout: impl Into<String>) -> Self {
        Self {
            run: SimulatedRun {
                exit_code: 0,
                stdout: stdout.into(),
                stderr: String::new(),
                timed_out: false,
            },
            unavailable: false,
        }
    }

    /// Fails with the given nonzero exit code and stderr.
    pub fn failing(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            run: SimulatedRun {
                exit_code,
                stdout: String::new(),
                stderr: stderr.into(),
                timed_out: false,
            },
            unavailable: false,
        }
    }

    /// Always reports a timeout, regardless of the timeout passed to `wait`.
    pub fn timing_out() -> Self {
        Self {
            run: SimulatedRun {
                exit_code: -1,
                stdout: String::new(),
                stderr: String::new(),
                timed_out: true,
            },
            unavailable: false,
        }
    }

    /// `start` always fails with [`SandboxError::Unavailable`], as if the
    /// container runtime were down.
    pub fn unavailable() -> Self {
        Self {
            run: SimulatedRun {
                exit_code: -1,
                stdout: String::new(),
                stderr: String::new(),
                timed_out: false,
            },
            unavailable: true,
        }
    }
}

#[async_trait]
impl SandboxRuntime for FakeSandbox {
    async fn start(&self, _command: &str, _workspace: &Path) -> Result<RunningSandbox, SandboxError> {
        if self.unavailable {
            return Err(SandboxError::Unavailable("simulated sandbox outage".into()));
        }
        Ok(RunningSandbox::Simulated(self.run.clone()))
    }

    async fn wait(&self, running: RunningSandbox, _timeout: Duration) -> SandboxWaitResult {
        match running {
            RunningSandbox::Simulated(run) => run.into_wait_result(),
            RunningSandbox::Process { .. } => {
                unreachable!("FakeSandbox::start never returns a RunningSandbox::Process")
            }
        }
    }

    fn name(&self) -> &str {
        "fake-sandbox"
    }
}
