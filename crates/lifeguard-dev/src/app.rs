use anyhow::Result;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

use crate::commands::{self, Cli, Commands};
use crate::config::EffectiveConfig;
use crate::console::{ConsoleReporter, Reporter};
use crate::errors::CliError;
use crate::logging::init_logging;
use crate::process::{ProcessRunner, SystemRunner};

/// Runs one invocation end to end and returns the process exit code.
pub async fn run(cli: Cli) -> i32 {
    let start = Instant::now();
    if let Err(e) = init_logging(&cli.log_level, &cli.log_format) { eprintln!("warning: logging not initialised: {e}"); }
    let reporter = ConsoleReporter::new();
    let cfg = match EffectiveConfig::load() {
        Ok(c) => c,
        Err(e) => {
            let code = report_failure(&reporter, &e);
            info!(took_ms=%start.elapsed().as_millis(), event="cli.finished", exit_code=code);
            return code;
        }
    };
    let exit_code = match dispatch(cli.command, &cfg, &SystemRunner, &reporter).await { Ok(()) => 0, Err(e) => report_failure(&reporter, &e) };
    info!(took_ms=%start.elapsed().as_millis(), event="cli.finished", exit_code=exit_code);
    exit_code
}

pub async fn dispatch(command: Commands, cfg: &EffectiveConfig, runner: &dyn ProcessRunner, reporter: &dyn Reporter) -> Result<()> {
    let start = Instant::now();
    let result = match command {
        Commands::Up {} => commands::up::handle(runner, reporter, cfg).instrument(info_span!("cmd.up", cluster=%cfg.cluster_name)).await,
        Commands::Down {} => commands::down::handle(runner, reporter, cfg).instrument(info_span!("cmd.down", cluster=%cfg.cluster_name)).await,
        Commands::Completions { shell } => { let _span = info_span!("cmd.completions").entered(); commands::completions::handle(shell) }
    };
    let took = start.elapsed().as_millis();
    match &result { Ok(_) => info!(event="cmd.finished", took_ms=%took), Err(_) => info!(event="cmd.failed", took_ms=%took) }
    result
}

fn report_failure(reporter: &dyn Reporter, e: &anyhow::Error) -> i32 {
    match find_cli_error(e) {
        Some(cli) => {
            reporter.error(&cli.kind.to_string());
            if let Some(hint) = cli.kind.hint() { reporter.detail(hint); }
            if let Some(src) = &cli.source { tracing::debug!(error=%format!("{src:#}"), "cli.error.source"); }
        }
        None => reporter.error(&format!("{e:#}")),
    }
    classify_exit_code(e)
}

fn find_cli_error(e: &anyhow::Error) -> Option<&CliError> {
    e.chain().find_map(|cur| cur.downcast_ref::<CliError>())
}

pub fn classify_exit_code(e: &anyhow::Error) -> i32 {
    for cur in e.chain() {
        if let Some(cli) = cur.downcast_ref::<CliError>() { tracing::debug!(?cli, code=cli.kind.code(), "classified_cli_error"); return cli.kind.code(); }
        if cur.downcast_ref::<std::io::Error>().is_some() { return 30; }
    }
    20
}
