use anyhow::{Result, Context};
use crate::errors::{CliError, CliErrorKind};
use tracing::debug;
use serde::Deserialize;
use std::{fs, path::PathBuf};

pub const DEFAULT_CLUSTER_NAME: &str = "lifeguard-test";
pub const DEFAULT_BOOTSTRAP_SCRIPT: &str = "scripts/setup_kind_cluster.sh";
pub const DEFAULT_BOOTSTRAP_SHELL: &str = "bash";
pub const DEFAULT_ORCHESTRATOR_UI_URL: &str = "http://localhost:10350";
pub const DEFAULT_DATABASE_HINT: &str = "localhost:5432";

/// Tools `up` refuses to start without, checked in this order.
pub const REQUIRED_TOOLS: [&str; 4] = ["docker", "kind", "kubectl", "tilt"];

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub cluster_name: Option<String>,
    pub kube_context: Option<String>,
    pub bootstrap_script: Option<PathBuf>,
    pub bootstrap_shell: Option<String>,
    pub orchestrator_ui_url: Option<String>,
    pub database_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub cluster_name: String,
    pub kube_context: String,
    pub bootstrap_script: PathBuf,
    pub bootstrap_shell: String,
    pub orchestrator_ui_url: String,
    pub database_hint: String,
}

impl Default for EffectiveConfig {
    fn default() -> Self { Self::layer(FileConfig::default(), |_| None) }
}

impl EffectiveConfig {
    pub fn load() -> Result<Self> {
        let cfg_path = config_file_path();
        debug!(path=?cfg_path, exists=?cfg_path.exists(), "config.load.attempt");
        let content = if cfg_path.exists() {
            let content = fs::read_to_string(&cfg_path).with_context(|| format!("read config {cfg_path:?}"))
                .map_err(|e| CliError::with_source(CliErrorKind::Config("failed to read config".into()), e))?;
            debug!(len=content.len(), "config.read");
            Some(content)
        } else { None };
        Self::from_sources(content.as_deref(), |key| std::env::var(key).ok())
    }

    /// Builds the effective config from optional TOML text and an environment lookup.
    pub fn from_sources(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file_cfg: FileConfig = match file {
            Some(content) => match toml::from_str(content) {
                Ok(v) => { debug!("config.parse.success"); v }
                Err(e) => { debug!(error=?e, "config.parse.error"); return Err(CliError::with_source(CliErrorKind::Config("failed to parse config".into()), e).into()); }
            },
            None => FileConfig::default(),
        };
        Ok(Self::layer(file_cfg, env))
    }

    fn layer(mut file_cfg: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());
        if let Some(v) = non_empty("LIFEGUARD_CLUSTER_NAME") { file_cfg.cluster_name = Some(v); }
        if let Some(v) = non_empty("LIFEGUARD_KUBE_CONTEXT") { file_cfg.kube_context = Some(v); }
        if let Some(v) = non_empty("LIFEGUARD_BOOTSTRAP_SCRIPT") { file_cfg.bootstrap_script = Some(PathBuf::from(v)); }
        if let Some(v) = non_empty("LIFEGUARD_BOOTSTRAP_SHELL") { file_cfg.bootstrap_shell = Some(v); }

        let cluster_name = file_cfg.cluster_name.unwrap_or_else(|| DEFAULT_CLUSTER_NAME.to_string());
        // kind names its kubeconfig context after the cluster
        let kube_context = file_cfg.kube_context.unwrap_or_else(|| format!("kind-{cluster_name}"));
        Self {
            kube_context,
            cluster_name,
            bootstrap_script: file_cfg.bootstrap_script.unwrap_or_else(|| PathBuf::from(DEFAULT_BOOTSTRAP_SCRIPT)),
            bootstrap_shell: file_cfg.bootstrap_shell.unwrap_or_else(|| DEFAULT_BOOTSTRAP_SHELL.to_string()),
            orchestrator_ui_url: file_cfg.orchestrator_ui_url.unwrap_or_else(|| DEFAULT_ORCHESTRATOR_UI_URL.to_string()),
            database_hint: file_cfg.database_hint.unwrap_or_else(|| DEFAULT_DATABASE_HINT.to_string()),
        }
    }
}

pub fn config_dir() -> PathBuf { dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("lifeguard") }
pub fn config_file_path() -> PathBuf { config_dir().join("dev.toml") }

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_the_lifeguard_cluster() {
        let cfg = EffectiveConfig::default();
        assert_eq!(cfg.cluster_name, "lifeguard-test");
        assert_eq!(cfg.kube_context, "kind-lifeguard-test");
        assert_eq!(cfg.bootstrap_script, PathBuf::from("scripts/setup_kind_cluster.sh"));
        assert_eq!(cfg.bootstrap_shell, "bash");
    }

    #[test]
    fn config_load_branches() {
        // Missing file
        let cfg = EffectiveConfig::from_sources(None, env_of(&[])).unwrap();
        assert_eq!(cfg, EffectiveConfig::default());

        // Parse error
        let err = EffectiveConfig::from_sources(Some("cluster_name = [unclosed"), env_of(&[])).unwrap_err();
        let s = format!("{err:#}");
        assert!(s.contains("failed to parse config"), "expected parse error, got: {s}");
        let cli = err.downcast_ref::<CliError>().expect("config errors are CliError");
        assert_eq!(cli.kind.code(), 10);

        // Valid file
        let cfg = EffectiveConfig::from_sources(Some("cluster_name='scratch'\nbootstrap_shell='sh'"), env_of(&[])).unwrap();
        assert_eq!(cfg.cluster_name, "scratch");
        assert_eq!(cfg.kube_context, "kind-scratch");
        assert_eq!(cfg.bootstrap_shell, "sh");

        // Env override wins over file, empty env values are ignored
        let cfg = EffectiveConfig::from_sources(
            Some("cluster_name='scratch'\nkube_context='docker-desktop'"),
            env_of(&[("LIFEGUARD_CLUSTER_NAME", "override"), ("LIFEGUARD_KUBE_CONTEXT", "")]),
        ).unwrap();
        assert_eq!(cfg.cluster_name, "override");
        assert_eq!(cfg.kube_context, "docker-desktop");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = EffectiveConfig::from_sources(Some("clustr_name='typo'"), env_of(&[])).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    proptest! {
        #[test]
        fn context_follows_cluster_name(name in "[a-z][a-z0-9-]{0,30}") {
            let cfg = EffectiveConfig::from_sources(None, env_of(&[("LIFEGUARD_CLUSTER_NAME", name.as_str())])).unwrap();
            prop_assert_eq!(cfg.kube_context, format!("kind-{name}"));
            prop_assert_eq!(cfg.cluster_name, name);
        }
    }
}
