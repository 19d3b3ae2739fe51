use crate::console::Reporter;
use crate::process::{CommandOutput, ForegroundExit, ProcessError, ProcessRunner};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Scripted result for one command line.
#[derive(Debug, Clone)]
pub enum Reply {
    Code(i32),
    Output { code: i32, stdout: &'static str },
    SpawnFails,
    /// The operator presses Ctrl-C while this command runs; the command never returns.
    Interrupted,
}

/// Runner that never touches the system: tools resolve unless marked missing and every
/// command succeeds unless a reply was scripted for its exact command line.
#[derive(Default)]
pub struct FakeRunner {
    missing: HashSet<String>,
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
    interrupt: Notify,
}

impl FakeRunner {
    pub fn new() -> Self { Self::default() }

    pub fn missing(mut self, tool: &str) -> Self { self.missing.insert(tool.to_string()); self }

    pub fn reply(mut self, command_line: &str, reply: Reply) -> Self { self.replies.insert(command_line.to_string(), reply); self }

    pub fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }

    pub fn called(&self, command_line: &str) -> bool { self.calls().iter().any(|c| c == command_line) }

    fn record(&self, program: &str, args: &[&str]) -> Option<Reply> {
        let line = std::iter::once(program).chain(args.iter().copied()).collect::<Vec<_>>().join(" ");
        self.calls.lock().unwrap().push(line.clone());
        self.replies.get(&line).cloned()
    }

    async fn interrupt_and_hang<T>(&self) -> T {
        self.interrupt.notify_one();
        std::future::pending().await
    }

    fn spawn_error(program: &str) -> ProcessError {
        ProcessError::Spawn { program: program.to_string(), source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure") }
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.contains(program) { None } else { Some(PathBuf::from("/usr/local/bin").join(program)) }
    }

    async fn capture(&self, program: &str, args: &[&str]) -> Result<CommandOutput, ProcessError> {
        match self.record(program, args) {
            None => Ok(CommandOutput { code: Some(0), ..Default::default() }),
            Some(Reply::Code(code)) => Ok(CommandOutput { code: Some(code), ..Default::default() }),
            Some(Reply::Output { code, stdout }) => Ok(CommandOutput { code: Some(code), stdout: stdout.to_string(), stderr: String::new() }),
            Some(Reply::SpawnFails) => Err(Self::spawn_error(program)),
            Some(Reply::Interrupted) => self.interrupt_and_hang().await,
        }
    }

    async fn inherit(&self, program: &str, args: &[&str]) -> Result<Option<i32>, ProcessError> {
        match self.record(program, args) {
            None => Ok(Some(0)),
            Some(Reply::Code(code)) | Some(Reply::Output { code, .. }) => Ok(Some(code)),
            Some(Reply::SpawnFails) => Err(Self::spawn_error(program)),
            Some(Reply::Interrupted) => self.interrupt_and_hang().await,
        }
    }

    async fn foreground(&self, program: &str, args: &[&str]) -> Result<ForegroundExit, ProcessError> {
        match self.record(program, args) {
            None => Ok(ForegroundExit::Exited(Some(0))),
            Some(Reply::Code(code)) | Some(Reply::Output { code, .. }) => Ok(ForegroundExit::Exited(Some(code))),
            Some(Reply::SpawnFails) => Err(Self::spawn_error(program)),
            Some(Reply::Interrupted) => Ok(ForegroundExit::Interrupted),
        }
    }

    async fn interrupted(&self) { self.interrupt.notified().await }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Info(String),
    Warn(String),
    Error(String),
    Detail(String),
    Blank,
}

/// Reporter that keeps every line for assertions.
#[derive(Default)]
pub struct Transcript { lines: Mutex<Vec<Line>> }

impl Transcript {
    pub fn new() -> Self { Self::default() }

    pub fn lines(&self) -> Vec<Line> { self.lines.lock().unwrap().clone() }

    pub fn has_info(&self, needle: &str) -> bool { self.lines().iter().any(|l| matches!(l, Line::Info(m) if m.contains(needle))) }

    pub fn has_warn(&self, needle: &str) -> bool { self.lines().iter().any(|l| matches!(l, Line::Warn(m) if m.contains(needle))) }

    pub fn warnings(&self) -> usize { self.lines().iter().filter(|l| matches!(l, Line::Warn(_))).count() }

    fn push(&self, line: Line) { self.lines.lock().unwrap().push(line); }
}

impl Reporter for Transcript {
    fn info(&self, msg: &str) { self.push(Line::Info(msg.to_string())); }
    fn warn(&self, msg: &str) { self.push(Line::Warn(msg.to_string())); }
    fn error(&self, msg: &str) { self.push(Line::Error(msg.to_string())); }
    fn detail(&self, msg: &str) { self.push(Line::Detail(msg.to_string())); }
    fn blank(&self) { self.push(Line::Blank); }
}
