// src/utils/error.rs
use crate::miner::scheduler::WorkerEvent;
use std::io;
use thiserror::Error;

/// Main error type for the mining application
///
/// Exhausting the nonce range or being cancelled are not errors; those are
/// reported through `SearchOutcome`. This enum covers invalid input and
/// failures of the machinery around the search.
#[derive(Error, Debug)]
pub enum MinerError {
    /// Configuration file or parameter errors, raised before any search starts
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Worker threads failed to start or every worker failed
    #[error("Worker error: {0}")]
    WorkerError(String),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// Invalid user input or parameter errors
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Converts crossbeam channel send errors for worker results into MinerError
///
/// Raised when a worker cannot hand its outcome back to the coordinator.
impl From<crossbeam_channel::SendError<WorkerEvent>> for MinerError {
    fn from(e: crossbeam_channel::SendError<WorkerEvent>) -> Self {
        MinerError::ChannelError(format!("Worker result send failed: {}", e))
    }
}

/// Converts hex decoding errors into MinerError
///
/// Used when a digest or previous hash given as hex cannot be decoded.
impl From<hex::FromHexError> for MinerError {
    fn from(e: hex::FromHexError) -> Self {
        MinerError::InputError(format!("Hex conversion failed: {}", e))
    }
}
