// src/stats/reporter.rs
use crate::miner::scheduler::StopSignal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use sysinfo::{Components, System};

/// Shared, monotonically increasing count of computed hashes
///
/// Workers add to it in batches and once more when they stop, so the total
/// is final as soon as a search has returned.
#[derive(Clone, Debug, Default)]
pub struct HashCounter(Arc<AtomicU64>);

impl HashCounter {
    /// Adds `hashes` to the total
    #[inline]
    pub fn add(&self, hashes: u64) {
        if hashes > 0 {
            self.0.fetch_add(hashes, Ordering::Relaxed);
        }
    }

    /// Hashes counted so far
    pub fn total(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Statistics related to mining performance
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    /// Total number of hashes computed
    pub hashes_total: u64,
    /// Number of solutions found
    pub solutions_found: u64,
    /// Seconds since the reporter was created
    pub elapsed_secs: f64,
    /// Average hashrate since the reporter was created (hashes per second)
    pub avg_hashrate: f64,
}

/// Statistics related to hardware performance
#[derive(Debug, Clone)]
pub struct HardwareStats {
    /// Current CPU usage percentage (0-100)
    pub cpu_usage: f32,
    /// Memory currently in use on the system (in bytes)
    pub memory_used: u64,
    /// Current CPU temperature in Celsius
    pub temperature: f32,
}

/// Collects and reports mining and hardware statistics
pub struct StatsReporter {
    /// Hashes computed by the workers
    hashes: HashCounter,
    /// Solutions recorded by the caller
    solutions: Arc<AtomicU64>,
    /// When collection started
    start_time: Instant,
    /// System information collector
    system: System,
    /// Hardware component information collector
    components: Components,
    /// Interval at which stats are reported
    report_interval: Duration,
}

impl StatsReporter {
    /// Creates a new StatsReporter with the specified reporting interval
    ///
    /// # Arguments
    /// * `report_interval` - How often to log statistics
    pub fn new(report_interval: Duration) -> Self {
        StatsReporter {
            hashes: HashCounter::default(),
            solutions: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
            system: System::new_all(),
            components: Components::new_with_refreshed_list(),
            report_interval,
        }
    }

    /// Counter to hand to the scheduler so its hashes are reported
    pub fn hash_counter(&self) -> HashCounter {
        self.hashes.clone()
    }

    /// Records a found solution
    pub fn record_solution(&self) {
        self.solutions.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets the current mining statistics
    ///
    /// # Returns
    /// A snapshot of the current mining statistics
    pub fn get_stats(&self) -> MiningStats {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let hashes = self.hashes.total();

        MiningStats {
            hashes_total: hashes,
            solutions_found: self.solutions.load(Ordering::Relaxed),
            elapsed_secs,
            avg_hashrate: if elapsed_secs > 0.0 {
                hashes as f64 / elapsed_secs
            } else {
                0.0
            },
        }
    }

    /// Gets the current hardware statistics
    ///
    /// This refreshes system information before returning the stats.
    pub fn get_hardware_stats(&mut self) -> HardwareStats {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();
        self.components.refresh(true);

        let cpus = self.system.cpus();
        let cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        let temperature = self
            .components
            .iter()
            .find(|c| c.label().contains("CPU"))
            .and_then(|c| c.temperature())
            .unwrap_or(0.0);

        HardwareStats {
            cpu_usage,
            memory_used: self.system.used_memory(),
            temperature,
        }
    }

    /// Starts the periodic reporting of statistics
    ///
    /// Spawns a background thread that logs stats every interval until
    /// `stop` is raised. The thread checks `stop` a few times per second so
    /// joining it after a search does not wait a full interval.
    pub fn start_reporting(&self, stop: StopSignal) -> JoinHandle<()> {
        let hashes = self.hashes.clone();
        let solutions = Arc::clone(&self.solutions);
        let start_time = self.start_time;
        let interval = self.report_interval;

        std::thread::spawn(move || {
            let mut reporter = StatsReporter {
                hashes,
                solutions,
                start_time,
                system: System::new_all(),
                components: Components::new_with_refreshed_list(),
                report_interval: interval,
            };
            let tick = interval.min(Duration::from_millis(200));
            let mut last_report = Instant::now();
            let mut last_hashes = 0u64;

            while !stop.is_raised() {
                std::thread::sleep(tick);
                if last_report.elapsed() < interval {
                    continue;
                }

                let mining_stats = reporter.get_stats();
                let hw_stats = reporter.get_hardware_stats();
                let window = last_report.elapsed().as_secs_f64();
                let current = (mining_stats.hashes_total - last_hashes) as f64 / window;

                log::info!(
                    "Hashrate: {} (avg {}) | Hashes: {} | CPU: {:.1}% | Temp: {:.1}°C",
                    format_hashrate(current),
                    format_hashrate(mining_stats.avg_hashrate),
                    mining_stats.hashes_total,
                    hw_stats.cpu_usage,
                    hw_stats.temperature
                );

                last_hashes = mining_stats.hashes_total;
                last_report = Instant::now();
            }
        })
    }
}

/// Formats a hashrate with an SI suffix, e.g. `"1.52 MH/s"`
pub fn format_hashrate(rate: f64) -> String {
    if rate >= 1e9 {
        format!("{:.2} GH/s", rate / 1e9)
    } else if rate >= 1e6 {
        format!("{:.2} MH/s", rate / 1e6)
    } else if rate >= 1e3 {
        format!("{:.2} kH/s", rate / 1e3)
    } else {
        format!("{:.2} H/s", rate)
    }
}
