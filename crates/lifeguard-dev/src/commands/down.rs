use anyhow::Result;
use tracing::info;
use crate::config::EffectiveConfig;
use crate::console::Reporter;
use crate::process::ProcessRunner;
use crate::shutdown::ShutdownSequencer;

pub async fn handle(runner: &dyn ProcessRunner, reporter: &dyn Reporter, cfg: &EffectiveConfig) -> Result<()> {
    let report = ShutdownSequencer::new(runner, reporter, cfg).run().await;
    info!(event="down.report", orchestrator=?report.orchestrator, cluster=?report.cluster);
    Ok(())
}
