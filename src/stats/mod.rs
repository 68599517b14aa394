//! Statistics collection and reporting module
//!
//! This module tracks how much hashing work a search has done:
//! - A shared hash counter the workers flush into
//! - Hashrate calculations
//! - Hardware monitoring (CPU, memory, temperature)
//!
//! The main component is [`StatsReporter`] which collects data and can periodically
//! report statistics to the log while a search runs.

/// Submodule containing the statistics reporter implementation
pub mod reporter;

// Re-export main components
pub use reporter::{HardwareStats, HashCounter, MiningStats, StatsReporter, format_hashrate};
