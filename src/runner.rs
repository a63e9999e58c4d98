//! Synchronous external command execution.
//!
//! The pipeline only sees [`CommandRunner`]; the system implementation spawns a
//! child with inherited stdio so the user watches the toolchain live, and
//! reports nothing but the exit code.
use crate::toolchain::Invocation;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Exit status of a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one invocation to completion in `cwd`.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation, cwd: &Path) -> Result<ExitOutcome>;
}

/// Runner that spawns real processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation, cwd: &Path) -> Result<ExitOutcome> {
        let start = Instant::now();
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("spawn {}", invocation.program))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            program = %invocation.program,
            elapsed_ms,
            code = ?status.code(),
            "child exited"
        );
        Ok(ExitOutcome {
            code: status.code(),
        })
    }
}
