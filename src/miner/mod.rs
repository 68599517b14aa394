// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components of the nonce search:
//! - Digest computation with a reusable prefix state
//! - The leading-zero difficulty rule
//! - Sequential search over one nonce partition
//! - Parallel coordination and cancellation

/// Digest engine
///
/// Hashes the nonce-independent prefix once and replays it per candidate.
pub mod digest;

/// Difficulty predicate
///
/// Counts leading zero hex digits of a digest.
pub mod difficulty;

/// Parallel search coordinator
///
/// Partitions the nonce space across worker threads, collects the result
/// and stops the remaining workers.
pub mod scheduler;

/// Sequential searcher
///
/// Walks a single nonce partition and tests each candidate.
pub mod worker;

// Re-export main components for cleaner imports
pub use self::difficulty::{meets_difficulty, satisfies};
pub use self::digest::{Digest, DigestEngine, PreparedState};
pub use self::scheduler::{Scheduler, SearchOutcome, Solution, StopSignal};
pub use self::worker::{NonceRange, Partition, Worker, WorkerOutcome, search};
