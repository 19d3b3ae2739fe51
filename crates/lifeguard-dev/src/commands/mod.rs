use clap::{Parser, Subcommand};

pub mod up;
pub mod down;
pub mod completions;

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum LogFormat { Auto, Text, Json }

#[derive(Parser, Debug)]
#[command(name = "lifeguard-dev", version, about = "Start and stop the Lifeguard local development environment (kind + tilt)")]
pub struct Cli {
    /// Log level for diagnostics on stderr: trace|debug|info|warn|error
    #[arg(long, default_value = "info")]
    pub log_level: String,
    /// Log format: auto|text|json
    #[arg(long, default_value = "auto")]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default flags for the parameterless `dev-up` / `dev-down` entry points.
    pub fn for_command(command: Commands) -> Self {
        Self { log_level: "info".into(), log_format: LogFormat::Auto, command }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check prerequisites, bring up the kind cluster and run tilt until Ctrl-C
    Up {},
    /// Stop tilt and delete the kind cluster (best effort, always exits 0)
    Down {},
    /// Generate shell completions (hidden)
    #[command(hide = true)]
    Completions { #[arg(long, default_value = "bash")] shell: String },
}
