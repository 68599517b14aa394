// src/cli/commands.rs
use crate::types::{AlgorithmType, NoncePosition, SearchStrategy};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// SHA Miner CLI - proof-of-work nonce search in Rust
#[derive(Parser, Debug)]
#[command(name = "sha-miner-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// The action to perform
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Mine a block in parallel until its difficulty is met
    Mine(MineOptions),

    /// Sequentially search for the lowest nonce appended to a text
    Search(SearchOptions),

    /// Measure hashing throughput
    Benchmark(BenchmarkOptions),

    /// Generate configuration file template
    Config(ConfigOptions),
}

/// Options for mining a block
#[derive(Parser, Debug)]
pub struct MineOptions {
    /// Path to configuration file (defaults apply when it does not exist)
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Block contents
    #[arg(short, long)]
    pub data: String,

    /// Hash of the previous block
    #[arg(short, long, default_value = "0000")]
    pub previous_hash: String,

    /// Block timestamp in seconds since the Unix epoch (default: now)
    #[arg(short, long, allow_negative_numbers = true)]
    pub timestamp: Option<i64>,

    /// Block height
    #[arg(short, long, default_value_t = 1)]
    pub index: u64,

    /// Required number of leading zero hex digits
    #[arg(short = 'D', long, default_value_t = 4)]
    pub difficulty: u32,

    /// Number of worker threads (overrides config)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Result strategy (overrides config)
    #[arg(short, long)]
    pub strategy: Option<SearchStrategy>,

    /// Nonce position in the preimage (overrides config)
    #[arg(long)]
    pub position: Option<NoncePosition>,

    /// Digest algorithm (overrides config)
    #[arg(short, long)]
    pub algorithm: Option<AlgorithmType>,

    /// Last nonce to try (overrides config)
    #[arg(long)]
    pub max_nonce: Option<u64>,

    /// Print the mined block as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Options for a sequential text search
#[derive(Parser, Debug)]
pub struct SearchOptions {
    /// Text the nonce is appended to
    #[arg(short, long)]
    pub text: String,

    /// Required number of leading zero hex digits
    #[arg(short = 'D', long)]
    pub difficulty: u32,

    /// First nonce to try
    #[arg(short, long, default_value_t = 0)]
    pub start: u64,

    /// Last nonce to try
    #[arg(short, long, default_value_t = u64::MAX)]
    pub max_nonce: u64,

    /// Digest algorithm
    #[arg(short, long, default_value_t = AlgorithmType::Sha256)]
    pub algorithm: AlgorithmType,
}

/// Options for running hashing benchmarks
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Algorithm to benchmark
    #[arg(short, long, default_value_t = AlgorithmType::Sha256)]
    pub algorithm: AlgorithmType,

    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 10)]
    pub duration: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}
