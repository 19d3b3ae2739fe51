//! Seam between the sequencers and the external tools they drive.
//!
//! Everything `up` and `down` do to the outside world goes through
//! [`ProcessRunner`], so the flows can be replayed against a scripted runner in
//! tests while [`SystemRunner`] spawns real children through `tokio::process`.

use async_trait::async_trait;
use std::{
    path::PathBuf,
    process::Stdio,
    time::Duration,
};
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// How long an interrupted foreground child gets to exit on its own before it is killed.
pub const INTERRUPT_GRACE: Duration = Duration::from_millis(250);

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, #[source] source: std::io::Error },
    #[error("failed waiting for {program}: {source}")]
    Wait { program: String, #[source] source: std::io::Error },
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[source] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool { self.code == Some(0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundExit {
    Exited(Option<i32>),
    Interrupted,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Resolves `program` on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Runs to completion with stdout and stderr captured.
    async fn capture(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ProcessError>;

    /// Runs to completion attached to the operator's terminal.
    async fn inherit(&self, program: &str, args: &[&str]) -> Result<Option<i32>, ProcessError>;

    /// Runs attached to the terminal until the child exits or the operator interrupts.
    async fn foreground(&self, program: &str, args: &[&str]) -> Result<ForegroundExit, ProcessError>;

    /// Resolves when the operator interrupts (SIGINT / Ctrl-C). Registration happens on first poll.
    async fn interrupted(&self);
}

#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> { which::which(program).ok() }

    async fn capture(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ProcessError> {
        debug!(%program, ?args, "process.capture");
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessError::Spawn { program: program.to_string(), source })?;
        let output = CommandOutput {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        };
        debug!(%program, code=?output.code, stderr_len=output.stderr.len(), "process.capture.done");
        Ok(output)
    }

    async fn inherit(&self, program: &str, args: &[&str]) -> Result<Option<i32>, ProcessError> {
        debug!(%program, ?args, "process.inherit");
        let status = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| ProcessError::Spawn { program: program.to_string(), source })?;
        Ok(status.code())
    }

    async fn foreground(&self, program: &str, args: &[&str]) -> Result<ForegroundExit, ProcessError> {
        debug!(%program, ?args, "process.foreground");
        // Register for SIGINT before the child exists so an early Ctrl-C is not lost.
        let mut interrupt = Interrupt::install()?;
        let mut child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn { program: program.to_string(), source })?;
        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| ProcessError::Wait { program: program.to_string(), source })?;
                Ok(ForegroundExit::Exited(status.code()))
            }
            _ = interrupt.recv() => {
                debug!(%program, "process.foreground.interrupted");
                reap_after_interrupt(program, &mut child).await;
                Ok(ForegroundExit::Interrupted)
            }
        }
    }

    async fn interrupted(&self) {
        match Interrupt::install() {
            Ok(mut interrupt) => interrupt.recv().await,
            Err(e) => {
                warn!(error=%e, "process.interrupt.unavailable");
                std::future::pending::<()>().await
            }
        }
    }
}

/// The terminal normally delivers Ctrl-C to the child as well; give it a moment, then kill it.
async fn reap_after_interrupt(program: &str, child: &mut Child) {
    match tokio::time::timeout(INTERRUPT_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!(%program, code=?status.code(), "process.foreground.exited_after_interrupt"),
        Ok(Err(e)) => warn!(%program, error=%e, "process.foreground.wait_failed"),
        Err(_) => {
            if let Err(e) = child.kill().await { warn!(%program, error=%e, "process.foreground.kill_failed"); }
            else { debug!(%program, "process.foreground.killed"); }
        }
    }
}

struct Interrupt {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
}

impl Interrupt {
    #[cfg(unix)]
    fn install() -> Result<Self, ProcessError> {
        use tokio::signal::unix::{signal, SignalKind};
        let sigint = signal(SignalKind::interrupt()).map_err(ProcessError::Signal)?;
        Ok(Self { sigint })
    }

    #[cfg(not(unix))]
    fn install() -> Result<Self, ProcessError> { Ok(Self {}) }

    #[cfg(unix)]
    async fn recv(&mut self) { self.sigint.recv().await; }

    #[cfg(not(unix))]
    async fn recv(&mut self) {
        if tokio::signal::ctrl_c().await.is_err() { std::future::pending::<()>().await; }
    }
}
