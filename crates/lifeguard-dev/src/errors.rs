use thiserror::Error;
use std::fmt;

#[derive(Error, Debug)]
pub enum CliErrorKind {
    #[error("{0} is not installed. Please install it first.")] MissingTool(String),
    #[error("Docker daemon is not running")] DaemonUnavailable,
    #[error("Failed to setup Kind cluster: {0}")] Bootstrap(String),
    #[error("usage error: {0}")] Usage(String),
    #[error("config error: {0}")] Config(String),
    #[error("runtime error: {0}")] Runtime(String),
}

#[derive(Debug)]
pub struct CliError { pub kind: CliErrorKind, pub source: Option<anyhow::Error> }
impl fmt::Display for CliError { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.kind.fmt(f) } }
impl std::error::Error for CliError { fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { self.source.as_ref().map(|e| e.as_ref() as _) } }

impl CliErrorKind {
    /// Process exit code for this failure. Every fatal `up` step maps to 1.
    pub fn code(&self) -> i32 {
        match self {
            Self::MissingTool(_) | Self::DaemonUnavailable | Self::Bootstrap(_) => 1,
            Self::Usage(_) => 2,
            Self::Config(_) => 10,
            Self::Runtime(_) => 20,
        }
    }

    /// Follow-up line printed under the error message, if the operator can act on it.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DaemonUnavailable => Some("Please start Docker Desktop and try again"),
            Self::Bootstrap(_) => Some("Check the output of the cluster setup script above"),
            _ => None,
        }
    }
}

impl CliError {
    pub fn new(kind: CliErrorKind) -> Self { Self { kind, source: None } }
    pub fn with_source<E: Into<anyhow::Error>>(kind: CliErrorKind, err: E) -> Self { Self { kind, source: Some(err.into()) } }
}
