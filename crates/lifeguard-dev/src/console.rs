//! Operator-facing status lines (`[INFO] ...`, `[WARN] ...`, `[ERROR] ...`).

use colored::Colorize;
use std::io::{IsTerminal, Write};
use tracing::debug;

pub trait Reporter: Send + Sync {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
    /// Indented continuation of the previous line.
    fn detail(&self, msg: &str);
    fn blank(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter { color: bool }

impl ConsoleReporter {
    pub fn new() -> Self { Self { color: std::io::stdout().is_terminal() } }

    fn tag(&self, label: &'static str) -> String {
        if !self.color { return format!("[{label}]"); }
        let text = format!("[{label}]");
        match label {
            "WARN" => text.yellow().bold().to_string(),
            "ERROR" => text.red().bold().to_string(),
            _ => text.green().to_string(),
        }
    }
}

impl Default for ConsoleReporter { fn default() -> Self { Self::new() } }

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        debug!(level="info", %msg, "console.line");
        println!("{} {msg}", self.tag("INFO"));
    }

    fn warn(&self, msg: &str) {
        debug!(level="warn", %msg, "console.line");
        println!("{} {msg}", self.tag("WARN"));
    }

    fn error(&self, msg: &str) {
        debug!(level="error", %msg, "console.line");
        // stdout may be buffered behind a pipe; keep ordering sane for readers of both streams
        let _ = std::io::stdout().flush();
        eprintln!("{} {msg}", self.tag("ERROR"));
    }

    fn detail(&self, msg: &str) {
        debug!(level="detail", %msg, "console.line");
        println!("   {msg}");
    }

    fn blank(&self) { println!(); }
}
