// src/config/mod.rs
//! Configuration management for the miner
//!
//! This module handles all configuration-related functionality including:
//! - Loading and parsing configuration files
//! - Generating configuration templates
//! - Validating settings before a search starts
//!
//! The configuration uses TOML format. Command-line flags override values
//! read from the file.

/// Core configuration implementation
///
/// Contains the [`Config`] struct that defines the miner's settings.
pub mod config;

// Re-export key items for easy access
pub use config::Config;

use crate::utils::error::MinerError;
use std::path::Path;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file
/// * `required` - When false, a missing file yields the default configuration
///
/// # Returns
/// * `Ok(Config)` - Loaded (or default) configuration
/// * `Err(MinerError)` - If the file couldn't be read or parsed
pub fn load(path: &Path, required: bool) -> Result<Config, MinerError> {
    if !required && !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    Config::load(path)
}

/// Generates a commented configuration template
pub fn generate_template() -> String {
    Config::generate_template()
}
