//! SHA Miner - proof-of-work nonce search in Rust
//!
//! This crate finds nonces whose SHA-256 digest, taken over a block payload
//! and the decimal nonce, starts with a required number of zero hex digits:
//! - A digest engine that hashes the fixed prefix once and replays it
//! - A deterministic sequential searcher
//! - A parallel coordinator with first-found and lowest-nonce strategies
//! - Cooperative cancellation and hashrate reporting

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Block payloads, hash templates and mined blocks
pub mod block;

/// Miner core implementation including digests and scheduling
pub mod miner;

/// Statistics collection and reporting functionality
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

// Core exports
pub use block::{BlockPayload, HashTemplate, MinedBlock};
pub use cli::Commands;
pub use config::Config;
pub use miner::{
    Digest, DigestEngine, NonceRange, Partition, Scheduler, SearchOutcome, Solution, StopSignal,
    Worker,
};
pub use stats::{HashCounter, MiningStats, StatsReporter};
pub use types::{AlgorithmType, NoncePosition, SearchStrategy};
pub use utils::{MinerError, init_logging};
