use anyhow::Result;
use tracing::info;
use crate::config::EffectiveConfig;
use crate::console::Reporter;
use crate::process::ProcessRunner;
use crate::startup::{StartupOutcome, StartupSequencer};

pub async fn handle(runner: &dyn ProcessRunner, reporter: &dyn Reporter, cfg: &EffectiveConfig) -> Result<()> {
    let outcome = StartupSequencer::new(runner, reporter, cfg).run().await?;
    match outcome {
        StartupOutcome::Interrupted => info!(event="up.stopped", interrupted=true),
        StartupOutcome::OrchestratorExited(code) => info!(event="up.stopped", interrupted=false, ?code),
    }
    Ok(())
}
