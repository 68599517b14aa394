// src/main.rs
use clap::Parser;
use sha_miner_rs::miner::difficulty::MAX_DIFFICULTY;
use sha_miner_rs::stats::format_hashrate;
use sha_miner_rs::*;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::runtime::Runtime;

/// Main entry point for the miner
///
/// # Returns
/// - `Ok(())` on successful execution, including searches without a solution
/// - `Err(MinerError)` on invalid configuration or a failed search
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        cli::Action::Mine(opts) => {
            utils::init_logging(cli.verbose);
            mine(opts)
        }
        cli::Action::Search(opts) => {
            utils::init_logging(cli.verbose);
            search(opts)
        }
        cli::Action::Benchmark(opts) => {
            utils::init_bench_logging();
            run_benchmark(opts)
        }
        cli::Action::Config(opts) => generate_config(opts),
    }
}

/// Mines a block with the parallel coordinator
///
/// # Operations
/// 1. Loads configuration and applies CLI overrides
/// 2. Validates everything before any mining output
/// 3. Installs a Ctrl-C handler that cancels the search
/// 4. Runs the search with periodic hashrate reporting
/// 5. Prints the mined block, or why there is none
fn mine(opts: cli::MineOptions) -> Result<(), MinerError> {
    let mut config = config::load(&opts.config, false)?;
    // Apply CLI overrides
    if let Some(workers) = opts.workers {
        config.worker_threads = workers;
    }
    if let Some(strategy) = opts.strategy {
        config.strategy = strategy;
    }
    if let Some(position) = opts.position {
        config.nonce_position = position;
    }
    if let Some(algo) = opts.algorithm {
        config.algorithm = algo.to_string();
    }
    if opts.max_nonce.is_some() {
        config.max_nonce = opts.max_nonce;
    }
    config.validate()?;

    let timestamp = match opts.timestamp {
        Some(ts) => ts,
        None => unix_now()?,
    };
    let payload = BlockPayload::new(
        opts.index,
        opts.previous_hash,
        opts.data,
        timestamp,
        opts.difficulty,
    );
    let engine = config.engine()?;
    let range = config.nonce_range()?;

    let reporter = StatsReporter::new(config.report_interval());
    let scheduler =
        Scheduler::new(engine, config.resolved_workers())?.with_counter(reporter.hash_counter());

    // Ctrl-C raises the scheduler's cancel handle; workers stop cooperatively
    let rt = Runtime::new()?;
    let cancel = scheduler.cancel_handle();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping workers");
            cancel.raise();
        }
    });

    log::info!(
        "Mining block {} (difficulty {}, {} workers, {}, nonce {})",
        payload.index,
        payload.difficulty,
        scheduler.worker_count(),
        config.strategy,
        config.nonce_position
    );

    let report_stop = StopSignal::new();
    let report_handle = reporter.start_reporting(report_stop.clone());
    let started = Instant::now();
    let outcome = scheduler.mine(&payload, config.nonce_position, range, config.strategy);
    report_stop.raise();
    let _ = report_handle.join();
    rt.shutdown_background();

    let elapsed = started.elapsed();
    let stats = reporter.get_stats();
    log::info!(
        "{} hashes in {:.2}s ({})",
        stats.hashes_total,
        elapsed.as_secs_f64(),
        format_hashrate(stats.hashes_total as f64 / elapsed.as_secs_f64().max(1e-9))
    );

    match outcome? {
        SearchOutcome::Found(solution) => {
            reporter.record_solution();
            let mined = payload.into_mined(&solution, config.nonce_position, engine.algorithm());
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&mined)?);
            } else {
                println!("Final hash: {}", mined.hash);
                println!("Nonce: {}", mined.nonce);
                println!("Worker: {}", solution.worker_id);
            }
        }
        SearchOutcome::Exhausted => println!("No solution found in nonce range"),
        SearchOutcome::Cancelled => println!("Mining interrupted before a solution was found"),
    }

    Ok(())
}

/// Sequential search for the lowest nonce appended to a text
fn search(opts: cli::SearchOptions) -> Result<(), MinerError> {
    let engine = DigestEngine::new(opts.algorithm);
    let started = Instant::now();

    match miner::search(
        &engine,
        opts.text.as_bytes(),
        opts.difficulty,
        opts.start,
        opts.max_nonce,
        1,
    )? {
        Some((digest_hex, nonce)) => {
            log::info!("Found after {:.2}s", started.elapsed().as_secs_f64());
            println!("Hash: {}", digest_hex);
            println!("Nonce: {}", nonce);
        }
        None => println!("No solution found in nonce range"),
    }
    Ok(())
}

/// Runs a hashing benchmark
///
/// # Operations
/// 1. Starts a parallel search at a difficulty no digest meets
/// 2. Cancels it after the requested duration
/// 3. Reports the hash count and average hashrate
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    let reporter = StatsReporter::new(Duration::from_secs(5));
    let scheduler = Scheduler::new(DigestEngine::new(opts.algorithm), opts.threads)?
        .with_counter(reporter.hash_counter());

    log::info!(
        "Starting {} benchmark for {} seconds on {} threads",
        opts.algorithm,
        opts.duration,
        opts.threads
    );

    let cancel = scheduler.cancel_handle();
    let duration = Duration::from_secs(opts.duration);
    let timer = std::thread::spawn(move || {
        std::thread::sleep(duration);
        cancel.raise();
    });

    let report_stop = StopSignal::new();
    let report_handle = reporter.start_reporting(report_stop.clone());
    let template = HashTemplate::nonce_last(vec![0u8; 76]);
    let outcome =
        scheduler.parallel_search(&template, MAX_DIFFICULTY, NonceRange::default());
    report_stop.raise();
    let _ = report_handle.join();
    let _ = timer.join();
    outcome?;

    // Report final results
    let stats = reporter.get_stats();
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", stats.hashes_total);
    log::info!("Average hashrate: {}", format_hashrate(stats.avg_hashrate));
    log::logger().flush();

    Ok(())
}

/// Writes a configuration template file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    if opts.output.exists() && !opts.force {
        return Err(MinerError::ConfigError(format!(
            "{} already exists (use --force to overwrite)",
            opts.output.display()
        )));
    }
    std::fs::write(&opts.output, config::generate_template())?;
    println!("Wrote {}", opts.output.display());
    Ok(())
}

fn unix_now() -> Result<i64, MinerError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| MinerError::InputError(format!("System clock before Unix epoch: {}", e)))?;
    Ok(now.as_secs() as i64)
}
