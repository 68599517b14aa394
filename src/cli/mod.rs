//! Command-line interface definitions

/// Argument and subcommand definitions
pub mod commands;

pub use commands::{Action, BenchmarkOptions, Commands, ConfigOptions, MineOptions, SearchOptions};
