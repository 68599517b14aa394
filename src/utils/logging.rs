//! Logging configuration and utilities
//!
//! This module handles logging setup for the miner, including:
//! - Standard logging configuration with a verbosity override
//! - Benchmark-specific logging
//! - Custom log formatting
//!
//! Uses `env_logger` under the hood with custom formatting and filtering.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;

/// Initializes the logging subsystem
///
/// # Configuration
/// - Logs to stderr, keeping stdout free for results (e.g. `--json`)
/// - `RUST_LOG` wins if set
/// - Otherwise the level comes from `verbosity`: 0 = info, 1 = debug, 2+ = trace
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    init_with_default(level);
}

/// Configures benchmark-specific logging
///
/// Same as [`init_logging`] but defaults to Debug so per-thread progress
/// is visible.
pub fn init_bench_logging() {
    init_with_default(LevelFilter::Debug);
}

fn init_with_default(level: LevelFilter) {
    let mut builder = common_log_config();

    if env::var("RUST_LOG").is_err() {
        builder.filter_level(level);
    } else {
        builder.parse_env("RUST_LOG");
    }

    // A logger may already be installed (tests, embedding applications)
    let _ = builder.try_init();
}

/// Creates a base logger builder with the `[ts LEVEL module:line] msg` format
fn common_log_config() -> Builder {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            use std::io::Write;
            let ts = buf.timestamp_seconds();
            let level = record.level();
            let module = record.module_path().unwrap_or_default();
            let line = record.line().unwrap_or(0);

            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                ts,
                level,
                module,
                line,
                record.args()
            )
        })
        .target(Target::Stderr);

    builder
}
