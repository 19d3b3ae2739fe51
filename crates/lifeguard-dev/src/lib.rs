//! Start and stop the Lifeguard local development environment: a kind cluster
//! with tilt redeploying workloads into it.
//!
//! `lifeguard-dev up` checks prerequisites, bootstraps the cluster and runs tilt
//! in the foreground; `lifeguard-dev down` tears both down on a best-effort basis.

pub mod app;
pub mod commands;
pub mod config;
pub mod console;
pub mod errors;
pub mod logging;
pub mod process;
pub mod shutdown;
pub mod startup;

#[cfg(test)]
pub(crate) mod test_support;
