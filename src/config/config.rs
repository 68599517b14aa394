// src/config/config.rs
use crate::miner::digest::DigestEngine;
use crate::miner::worker::NonceRange;
use crate::types::{NoncePosition, SearchStrategy};
use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the miner
///
/// Contains every setting of a search that is not part of the block itself:
/// digest algorithm, worker count, result strategy, preimage layout and the
/// nonce bounds. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Digest algorithm to use ("sha256" or "sha256d")
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Number of worker threads (0 = number of CPU cores)
    #[serde(default)]
    pub worker_threads: usize,

    /// Which solution the coordinator returns
    #[serde(default)]
    pub strategy: SearchStrategy,

    /// Where the nonce sits in the block preimage
    #[serde(default)]
    pub nonce_position: NoncePosition,

    /// First nonce to test
    #[serde(default)]
    pub start_nonce: u64,

    /// Last nonce to test; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nonce: Option<u64>,

    /// Seconds between hashrate reports while mining
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_algorithm() -> String {
    "sha256".into()
}

fn default_report_interval() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Config {
            algorithm: default_algorithm(),
            worker_threads: 0,
            strategy: SearchStrategy::default(),
            nonce_position: NoncePosition::default(),
            start_nonce: 0,
            max_nonce: None,
            report_interval_secs: default_report_interval(),
        }
    }
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(MinerError)` - If file couldn't be read or parsed
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, MinerError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            MinerError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_str)
    }

    /// Parses configuration from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, MinerError> {
        toml::from_str(s)
            .map_err(|e| MinerError::ConfigError(format!("Invalid config format: {}", e)))
    }

    /// Checks the settings that can be checked without a block
    ///
    /// Fails fast so no search starts with a bad configuration.
    pub fn validate(&self) -> Result<(), MinerError> {
        self.engine()?;
        self.nonce_range()?;
        if self.report_interval_secs == 0 {
            return Err(MinerError::ConfigError(
                "report_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Digest engine for the configured algorithm
    pub fn engine(&self) -> Result<DigestEngine, MinerError> {
        DigestEngine::from_name(&self.algorithm)
    }

    /// Configured nonce bounds
    pub fn nonce_range(&self) -> Result<NonceRange, MinerError> {
        NonceRange::new(self.start_nonce, self.max_nonce.unwrap_or(u64::MAX))
    }

    /// Worker count with `0` resolved to the available CPU cores
    pub fn resolved_workers(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }

    /// Interval between hashrate reports
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.max(1))
    }

    /// Generates a configuration template string
    ///
    /// # Returns
    /// String containing a commented TOML configuration template that
    /// parses back to the default configuration
    pub fn generate_template() -> String {
        let mut template = String::new();
        template.push_str("# SHA Miner Configuration\n\n");
        template.push_str("# Supported algorithms: sha256, sha256d\n");
        template.push_str("algorithm = \"sha256\"\n");
        template.push_str("# Number of worker threads (0 = auto-detect)\n");
        template.push_str("worker_threads = 0\n");
        template.push_str("# first-found: fastest, any valid nonce\n");
        template.push_str("# lowest: smallest valid nonce in range\n");
        template.push_str("strategy = \"first-found\"\n");
        template.push_str("# leading: {nonce}{data}{timestamp}\n");
        template.push_str("# trailing: {previous_hash}{data}{timestamp}{nonce}\n");
        template.push_str("nonce_position = \"leading\"\n");
        template.push_str("# Nonce bounds (max_nonce unset = unbounded)\n");
        template.push_str("start_nonce = 0\n");
        template.push_str("# max_nonce = 100000000\n");
        template.push_str("# Seconds between hashrate reports\n");
        template.push_str("report_interval_secs = 10\n");
        template
    }
}
