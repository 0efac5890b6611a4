use crate::metrics::{DEFAULT_K, DEFAULT_ROUNDS};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Challenge server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Rounds at which rankings are evaluated
    #[serde(default = "default_rounds")]
    pub rounds: Vec<u32>,

    /// Depth for precision at k
    #[serde(default = "default_k")]
    pub k: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            rounds: default_rounds(),
            k: default_k(),
        }
    }
}

fn default_rounds() -> Vec<u32> {
    DEFAULT_ROUNDS.to_vec()
}

fn default_k() -> usize {
    DEFAULT_K
}

/// Endpoints and request policy for the challenge server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// URL prefix for run decisions: `<results_url><token>/<run>`
    #[serde(default = "default_results_url")]
    pub results_url: String,

    /// URL prefix for rankings: `<rankings_url><token>/<run>/<round>`
    #[serde(default = "default_rankings_url")]
    pub rankings_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            results_url: default_results_url(),
            rankings_url: default_rankings_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

fn default_results_url() -> String {
    "http://erisk.irlab.org/challenge-t1e/results/".to_string()
}

fn default_rankings_url() -> String {
    "http://erisk.irlab.org/challenge-t1e/retrieve/".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

impl EvalConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EvalConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            bail!("k must be at least 1");
        }
        if self.rounds.is_empty() {
            bail!("at least one ranking round must be configured");
        }
        if self.server.retries == 0 {
            bail!("server.retries must be at least 1");
        }
        Ok(())
    }

    /// Generate a sample configuration
    pub fn sample() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config() {
        let config = EvalConfig::sample();
        assert_eq!(config.rounds, vec![1, 50, 100, 500, 1000, 2000]);
        assert_eq!(config.k, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EvalConfig = serde_yaml::from_str("rounds: [1, 50]\n").unwrap();
        assert_eq!(config.rounds, vec![1, 50]);
        assert_eq!(config.k, 10);
        assert_eq!(config.server, ServerSettings::default());
    }

    #[test]
    fn test_zero_k_rejected() {
        let config = EvalConfig {
            k: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval-config.yaml");
        let config = EvalConfig::sample();

        config.save(&path).unwrap();
        let parsed = EvalConfig::load(&path).unwrap();
        assert_eq!(parsed, config);
    }
}
