//! `down`: stop tilt, then delete the kind cluster. Every step is best effort.

use tracing::{debug, info};

use crate::config::EffectiveConfig;
use crate::console::Reporter;
use crate::process::{CommandOutput, ProcessError, ProcessRunner};

/// Matches the foreground process started by `up`.
const ORCHESTRATOR_PATTERN: &str = "tilt up";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorStop {
    /// `tilt down` succeeded.
    Graceful,
    /// `tilt down` failed but `pkill` matched a running `tilt up`.
    Killed,
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterCleanup {
    Deleted,
    /// Deletion failed but the cluster is not listed any more.
    AlreadyAbsent,
    /// Deletion failed and the cluster is still listed.
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub orchestrator: OrchestratorStop,
    pub cluster: ClusterCleanup,
}

pub struct ShutdownSequencer<'a> {
    runner: &'a dyn ProcessRunner,
    reporter: &'a dyn Reporter,
    config: &'a EffectiveConfig,
}

impl<'a> ShutdownSequencer<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, reporter: &'a dyn Reporter, config: &'a EffectiveConfig) -> Self {
        Self { runner, reporter, config }
    }

    /// Never fails: whatever the external tools report, the run ends with a summary line.
    pub async fn run(&self) -> ShutdownReport {
        self.reporter.info("🛑 Stopping Lifeguard development environment...");
        let orchestrator = self.stop_orchestrator().await;
        let cluster = self.delete_cluster().await;
        info!(event="down.finished", ?orchestrator, ?cluster);
        self.reporter.info("✅ Development environment stopped and cleaned up");
        ShutdownReport { orchestrator, cluster }
    }

    pub async fn stop_orchestrator(&self) -> OrchestratorStop {
        self.reporter.info("Stopping Tilt...");
        if succeeded(self.runner.capture("tilt", &["down"]).await) {
            self.reporter.info("✅ Tilt stopped");
            return OrchestratorStop::Graceful;
        }
        if succeeded(self.runner.capture("pkill", &["-f", ORCHESTRATOR_PATTERN]).await) {
            self.reporter.info("✅ Tilt stopped (via pkill)");
            return OrchestratorStop::Killed;
        }
        self.reporter.warn("No Tilt processes found (or already stopped)");
        OrchestratorStop::NotRunning
    }

    pub async fn delete_cluster(&self) -> ClusterCleanup {
        self.reporter.info("Stopping Kind cluster...");
        let name = self.config.cluster_name.as_str();
        if succeeded(self.runner.capture("kind", &["delete", "cluster", "--name", name]).await) {
            self.reporter.info("✅ Kind cluster deleted");
            return ClusterCleanup::Deleted;
        }
        if self.cluster_listed(name).await {
            self.reporter.warn("Cluster deletion had issues, but continuing with cleanup");
            ClusterCleanup::Incomplete
        } else {
            self.reporter.info("Cluster already deleted or does not exist");
            ClusterCleanup::AlreadyAbsent
        }
    }

    /// Looks at stdout whatever the exit code; a listing that cannot run lists nothing.
    async fn cluster_listed(&self, name: &str) -> bool {
        match self.runner.capture("kind", &["get", "clusters"]).await {
            Ok(out) => {
                if !out.success() { debug!(code=?out.code, stderr=%out.stderr.trim(), "down.list.failed"); }
                lists_cluster(&out.stdout, name)
            }
            Err(e) => { debug!(error=%e, "down.list.unavailable"); false }
        }
    }
}

fn succeeded(result: Result<CommandOutput, ProcessError>) -> bool {
    match result {
        Ok(out) => out.success(),
        Err(e) => { debug!(error=%e, "down.command.unavailable"); false }
    }
}

/// `kind get clusters` prints one cluster name per line.
pub fn lists_cluster(listing: &str, name: &str) -> bool {
    listing.lines().any(|line| line.trim() == name)
}
