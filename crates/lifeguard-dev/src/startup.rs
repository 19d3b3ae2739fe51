//! `up`: prerequisites, Docker, kind bootstrap, kube context, then tilt in the foreground.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::{EffectiveConfig, REQUIRED_TOOLS};
use crate::console::Reporter;
use crate::errors::{CliError, CliErrorKind};
use crate::process::{ForegroundExit, ProcessRunner};

const ORCHESTRATOR: &str = "tilt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// tilt returned on its own; carries its exit code.
    OrchestratorExited(Option<i32>),
    /// The operator pressed Ctrl-C while tilt was running. The cluster is left up.
    Interrupted,
}

pub struct StartupSequencer<'a> {
    runner: &'a dyn ProcessRunner,
    reporter: &'a dyn Reporter,
    config: &'a EffectiveConfig,
}

impl<'a> StartupSequencer<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, reporter: &'a dyn Reporter, config: &'a EffectiveConfig) -> Self {
        Self { runner, reporter, config }
    }

    pub async fn run(&self) -> Result<StartupOutcome> {
        self.reporter.info("🚀 Starting Lifeguard development environment (Kind)...");
        self.check_prerequisites()?;
        // Ctrl-C before tilt is up ends the run the same way as Ctrl-C while it runs.
        let prepared = tokio::select! {
            biased;
            _ = self.runner.interrupted() => false,
            res = self.prepare_cluster() => { res?; true }
        };
        let outcome = if prepared { self.launch_orchestrator().await? } else { StartupOutcome::Interrupted };
        match outcome {
            StartupOutcome::Interrupted => self.report_interrupted(),
            StartupOutcome::OrchestratorExited(Some(0)) => info!(event="up.orchestrator.exited", "tilt exited"),
            StartupOutcome::OrchestratorExited(code) => {
                warn!(event="up.orchestrator.exited", ?code, "tilt exited with failure");
                self.reporter.warn(&format!("Tilt exited with status {}", describe(code)));
            }
        }
        Ok(outcome)
    }

    async fn prepare_cluster(&self) -> Result<()> {
        self.check_daemon().await?;
        self.bootstrap_cluster().await?;
        self.switch_context().await;
        Ok(())
    }

    /// Fails on the first tool that does not resolve, before anything is executed.
    pub fn check_prerequisites(&self) -> Result<()> {
        for tool in REQUIRED_TOOLS {
            match self.runner.locate(tool) {
                Some(path) => debug!(%tool, path=%path.display(), "up.prerequisite.found"),
                None => return Err(CliError::new(CliErrorKind::MissingTool(tool.to_string())).into()),
            }
        }
        Ok(())
    }

    pub async fn check_daemon(&self) -> Result<()> {
        self.reporter.info("Checking Docker daemon...");
        match self.runner.capture("docker", &["info"]).await {
            Ok(out) if out.success() => {
                self.reporter.info("✅ Docker daemon is running");
                Ok(())
            }
            Ok(out) => {
                debug!(code=?out.code, stderr=%out.stderr.trim(), "up.docker.unreachable");
                Err(CliError::new(CliErrorKind::DaemonUnavailable).into())
            }
            Err(e) => Err(CliError::with_source(CliErrorKind::DaemonUnavailable, e).into()),
        }
    }

    /// Runs the kind setup script with the terminal attached; it waits for the database itself.
    pub async fn bootstrap_cluster(&self) -> Result<()> {
        self.reporter.info("Setting up Kind cluster...");
        let script = self.config.bootstrap_script.to_string_lossy().into_owned();
        let shell = self.config.bootstrap_shell.as_str();
        match self.runner.inherit(shell, &[script.as_str()]).await {
            Ok(Some(0)) => {
                info!(event="up.bootstrap.done", cluster=%self.config.cluster_name);
                Ok(())
            }
            Ok(code) => Err(CliError::new(CliErrorKind::Bootstrap(format!("{script} exited with {}", describe(code)))).into()),
            Err(e) => Err(CliError::with_source(CliErrorKind::Bootstrap(format!("could not run {script} with {shell}")), e).into()),
        }
    }

    /// Best effort: on failure tilt runs against whatever context is already active.
    pub async fn switch_context(&self) -> bool {
        self.reporter.info("Setting kubeconfig context...");
        let context = self.config.kube_context.as_str();
        let switched = match self.runner.capture("kubectl", &["config", "use-context", context]).await {
            Ok(out) if out.success() => true,
            Ok(out) => { debug!(code=?out.code, stderr=%out.stderr.trim(), "up.context.failed"); false }
            Err(e) => { debug!(error=%e, "up.context.failed"); false }
        };
        if switched {
            self.reporter.info(&format!("✅ Context set to {context}"));
        } else {
            self.reporter.warn(&format!("⚠️  Could not set {context} context, using current context"));
        }
        switched
    }

    pub async fn launch_orchestrator(&self) -> Result<StartupOutcome> {
        self.reporter.info("🎯 Starting Tilt...");
        self.reporter.detail(&format!("Tilt UI: {}", self.config.orchestrator_ui_url));
        self.reporter.detail(&format!("PostgreSQL: {} (via Tilt port forward)", self.config.database_hint));
        let exit = self.runner.foreground(ORCHESTRATOR, &["up"]).await
            .map_err(|e| CliError::with_source(CliErrorKind::Runtime("could not start tilt".into()), e))?;
        Ok(match exit {
            ForegroundExit::Interrupted => StartupOutcome::Interrupted,
            ForegroundExit::Exited(code) => StartupOutcome::OrchestratorExited(code),
        })
    }

    fn report_interrupted(&self) {
        info!(event="up.interrupted", cluster=%self.config.cluster_name);
        self.reporter.blank();
        self.reporter.info("🛑 Shutting down gracefully...");
        self.reporter.detail("Tilt has been stopped");
        self.reporter.detail("Kind cluster is still running (use 'lifeguard-dev down' to stop it)");
        self.reporter.blank();
        self.reporter.info("✅ Shutdown complete");
    }
}

fn describe(code: Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "a signal".to_string())
}
