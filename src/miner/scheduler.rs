// src/miner/scheduler.rs
//! Parallel nonce search coordination
//!
//! Splits the nonce space into strided partitions, runs one [`Worker`] per
//! partition on its own thread, and gathers the result. Workers share only
//! a stop signal, the result channel and the hash counter.

use crate::block::{BlockPayload, HashTemplate};
use crate::miner::difficulty::is_attainable;
use crate::miner::digest::{Digest, DigestEngine, PreparedState};
use crate::miner::worker::{NonceRange, Partition, Worker, WorkerOutcome};
use crate::stats::HashCounter;
use crate::types::{NoncePosition, SearchStrategy};
use crate::utils::error::MinerError;
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

/// Write-once flag shared between the coordinator and its workers
///
/// Clones observe the same flag. Workers poll it on every iteration.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Creates a lowered signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal for every clone
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the signal has been raised
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Lowers the signal so it can be reused for another search
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A nonce whose digest meets the difficulty
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    /// The winning nonce
    pub nonce: u64,
    /// Digest of the preimage with the winning nonce
    pub digest: Digest,
    /// Worker that found it
    pub worker_id: usize,
}

impl Solution {
    /// Lowercase hex of the winning digest
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }
}

/// Result of a coordinated search
///
/// `Exhausted` and `Cancelled` both mean "no solution", but are kept apart
/// so callers can report them differently.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A worker found a solution
    Found(Solution),
    /// Every partition was searched up to `max_nonce` without a match
    Exhausted,
    /// The operator stopped the search before a solution, or before a
    /// lowest-nonce search could prove its best candidate
    Cancelled,
}

impl SearchOutcome {
    /// The solution, if one was found
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SearchOutcome::Found(solution) => Some(solution),
            _ => None,
        }
    }

    /// Whether a solution was found
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }
}

/// Message a worker thread sends to the coordinator when it stops
#[derive(Debug)]
pub struct WorkerEvent {
    /// Worker that stopped
    pub worker_id: usize,
    /// Why it stopped
    pub outcome: WorkerOutcome,
}

/// Coordinates a nonce search across worker threads
pub struct Scheduler {
    /// Digest algorithm shared by all workers
    engine: DigestEngine,
    /// Number of partitions and threads
    worker_count: usize,
    /// Operator cancellation, shared with callers through `cancel_handle`
    cancel: StopSignal,
    /// Hashes computed by all workers
    counter: HashCounter,
    #[cfg(test)]
    failing: Vec<usize>,
}

/// What the workers of one search reported
#[derive(Debug, Default)]
struct Tally {
    solution: Option<Solution>,
    /// Lowest nonce a halted worker left unexamined
    unexamined: Option<u64>,
    failed: usize,
}

impl Tally {
    fn halted(&mut self, next_nonce: u64) {
        self.unexamined = Some(self.unexamined.map_or(next_nonce, |n| n.min(next_nonce)));
    }

    /// Keeps the lowest solution; `None` counts a failed worker
    fn record_lowest(&mut self, outcome: Option<WorkerOutcome>) {
        match outcome {
            Some(WorkerOutcome::Found(solution)) => {
                if self.solution.is_none_or(|best| solution.nonce < best.nonce) {
                    self.solution = Some(solution);
                }
            }
            Some(WorkerOutcome::Halted(next_nonce)) => self.halted(next_nonce),
            Some(WorkerOutcome::Exhausted) => {}
            None => self.failed += 1,
        }
    }
}

impl Scheduler {
    /// Creates a new Scheduler instance
    ///
    /// # Arguments
    /// * `engine` - Digest engine every worker hashes with
    /// * `worker_count` - Number of workers; must be positive
    ///
    /// # Errors
    /// `MinerError::ConfigError` when `worker_count` is zero.
    pub fn new(engine: DigestEngine, worker_count: usize) -> Result<Self, MinerError> {
        if worker_count == 0 {
            return Err(MinerError::ConfigError(
                "Worker count must be at least 1".into(),
            ));
        }
        Ok(Scheduler {
            engine,
            worker_count,
            cancel: StopSignal::new(),
            counter: HashCounter::default(),
            #[cfg(test)]
            failing: Vec::new(),
        })
    }

    /// Reports hashes into an externally owned counter
    pub fn with_counter(mut self, counter: HashCounter) -> Self {
        self.counter = counter;
        self
    }

    /// Handle that cancels running and future searches when raised
    pub fn cancel_handle(&self) -> StopSignal {
        self.cancel.clone()
    }

    /// Counter of hashes computed so far
    pub fn hash_counter(&self) -> HashCounter {
        self.counter.clone()
    }

    /// Number of workers per search
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Mines `payload` at its own difficulty
    pub fn mine(
        &self,
        payload: &BlockPayload,
        position: NoncePosition,
        range: NonceRange,
        strategy: SearchStrategy,
    ) -> Result<SearchOutcome, MinerError> {
        self.search(&payload.template(position), payload.difficulty, range, strategy)
    }

    /// Runs a search with the given strategy
    pub fn search(
        &self,
        template: &HashTemplate,
        difficulty: u32,
        range: NonceRange,
        strategy: SearchStrategy,
    ) -> Result<SearchOutcome, MinerError> {
        match strategy {
            SearchStrategy::FirstFound => self.parallel_search(template, difficulty, range),
            SearchStrategy::Lowest => self.lowest_search(template, difficulty, range),
        }
    }

    /// First-found-wins search
    ///
    /// Returns the solution of whichever worker reports first. When several
    /// solutions exist the winner is not necessarily the lowest nonce and may
    /// differ between runs. All workers have stopped when this returns.
    pub fn parallel_search(
        &self,
        template: &HashTemplate,
        difficulty: u32,
        range: NonceRange,
    ) -> Result<SearchOutcome, MinerError> {
        if !is_attainable(difficulty) {
            return Ok(self.unattainable(difficulty));
        }
        log::info!(
            "Searching nonces {}..={} at difficulty {} with {} workers ({})",
            range.start_nonce,
            range.max_nonce,
            difficulty,
            self.worker_count,
            self.engine.algorithm()
        );

        let state = self.engine.prepare_template(template);
        let found = StopSignal::new();
        let (event_sender, event_receiver) = crossbeam_channel::unbounded();
        let mut handles = Vec::with_capacity(self.worker_count);

        for id in 0..self.worker_count {
            let worker = self
                .worker(id, &state, difficulty, range)
                .with_found_signal(found.clone());
            let sender = event_sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("nonce-worker-{}", id))
                .spawn(move || run_worker(worker, sender));

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    found.raise();
                    drop(event_sender);
                    join_workers(handles);
                    return Err(e.into());
                }
            }
        }
        // The channel closes once every worker has exited
        drop(event_sender);

        let mut tally = Tally::default();
        for event in event_receiver.iter() {
            match event.outcome {
                WorkerOutcome::Found(solution) if tally.solution.is_none() => {
                    found.raise();
                    log::debug!(
                        "Worker {} found nonce {}, stopping the others",
                        event.worker_id,
                        solution.nonce
                    );
                    tally.solution = Some(solution);
                }
                WorkerOutcome::Found(solution) => log::debug!(
                    "Worker {} also found nonce {} after the winner",
                    event.worker_id,
                    solution.nonce
                ),
                WorkerOutcome::Exhausted => {
                    log::debug!("Worker {} exhausted its partition", event.worker_id)
                }
                WorkerOutcome::Halted(next_nonce) => {
                    log::debug!("Worker {} halted before nonce {}", event.worker_id, next_nonce);
                    tally.halted(next_nonce);
                }
            }
        }

        tally.failed = join_workers(handles);
        self.conclude(tally, SearchStrategy::FirstFound)
    }

    /// Lowest-nonce search
    ///
    /// Workers share a ceiling holding the lowest nonce found so far and stop
    /// once their next candidate is above it, so the result equals what a
    /// sequential search over the same range returns. A search cancelled
    /// before every nonce below the best candidate was examined reports
    /// `Cancelled` rather than an unproven nonce.
    pub fn lowest_search(
        &self,
        template: &HashTemplate,
        difficulty: u32,
        range: NonceRange,
    ) -> Result<SearchOutcome, MinerError> {
        if !is_attainable(difficulty) {
            return Ok(self.unattainable(difficulty));
        }
        log::info!(
            "Searching lowest nonce in {}..={} at difficulty {} with {} workers ({})",
            range.start_nonce,
            range.max_nonce,
            difficulty,
            self.worker_count,
            self.engine.algorithm()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|i| format!("nonce-worker-{}", i))
            .build()
            .map_err(|e| MinerError::WorkerError(format!("Failed to build worker pool: {}", e)))?;

        let state = self.engine.prepare_template(template);
        let ceiling = Arc::new(AtomicU64::new(u64::MAX));

        let outcomes: Vec<Option<WorkerOutcome>> = pool.install(|| {
            (0..self.worker_count)
                .into_par_iter()
                .with_max_len(1)
                .map(|id| {
                    let worker = self
                        .worker(id, &state, difficulty, range)
                        .with_ceiling(Arc::clone(&ceiling));
                    match panic::catch_unwind(AssertUnwindSafe(|| worker.run())) {
                        Ok(outcome) => Some(outcome),
                        Err(_) => {
                            log::warn!("Worker {} panicked", id);
                            None
                        }
                    }
                })
                .collect()
        });

        let mut tally = Tally::default();
        for outcome in outcomes {
            tally.record_lowest(outcome);
        }
        self.conclude(tally, SearchStrategy::Lowest)
    }

    fn unattainable(&self, difficulty: u32) -> SearchOutcome {
        log::info!(
            "Difficulty {} is above the {} hex digits of a digest, nothing to search",
            difficulty,
            crate::miner::difficulty::MAX_DIFFICULTY
        );
        SearchOutcome::Exhausted
    }

    fn worker(
        &self,
        id: usize,
        state: &PreparedState,
        difficulty: u32,
        range: NonceRange,
    ) -> Worker {
        let worker = Worker::new(
            id,
            self.engine,
            state.clone(),
            difficulty,
            Partition::for_worker(range.start_nonce, id, self.worker_count),
            range.max_nonce,
        )
        .with_cancel(self.cancel.clone())
        .with_counter(self.counter.clone());

        #[cfg(test)]
        if self.failing.contains(&id) {
            return worker.panicking();
        }
        worker
    }

    /// Turns worker reports into the search result
    ///
    /// A lowest-nonce solution only stands when no halted worker skipped a
    /// smaller nonce. Without a solution, any halt means the search was
    /// cancelled; otherwise every surviving partition was exhausted.
    fn conclude(
        &self,
        tally: Tally,
        strategy: SearchStrategy,
    ) -> Result<SearchOutcome, MinerError> {
        if let Some(solution) = tally.solution {
            let unproven = strategy == SearchStrategy::Lowest
                && tally.unexamined.is_some_and(|n| n < solution.nonce);
            if !unproven {
                log::info!(
                    "Found nonce {} (worker {}): {}",
                    solution.nonce,
                    solution.worker_id,
                    solution.digest
                );
                return Ok(SearchOutcome::Found(solution));
            }
            log::info!(
                "Search cancelled before nonces below {} were examined",
                solution.nonce
            );
            return Ok(SearchOutcome::Cancelled);
        }
        if tally.failed == self.worker_count {
            return Err(MinerError::WorkerError(format!(
                "All {} workers failed",
                self.worker_count
            )));
        }
        if tally.unexamined.is_some() {
            log::info!("Search cancelled before a solution was found");
            Ok(SearchOutcome::Cancelled)
        } else {
            log::info!("Nonce range exhausted without a solution");
            Ok(SearchOutcome::Exhausted)
        }
    }
}

fn run_worker(worker: Worker, sender: Sender<WorkerEvent>) -> Result<(), MinerError> {
    let worker_id = worker.id();
    let outcome = worker.run();
    sender.send(WorkerEvent { worker_id, outcome })?;
    Ok(())
}

/// Joins every worker thread and returns how many failed
fn join_workers(handles: Vec<JoinHandle<Result<(), MinerError>>>) -> usize {
    let mut failed = 0;
    for handle in handles {
        let name = handle.thread().name().unwrap_or("nonce-worker").to_owned();
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("{} failed: {}", name, e);
                failed += 1;
            }
            Err(_) => {
                log::warn!("{} panicked", name);
                failed += 1;
            }
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::difficulty::satisfies;
    use crate::miner::worker;
    use std::time::Duration;

    fn template() -> HashTemplate {
        HashTemplate::nonce_last("scheduler-test")
    }

    #[test]
    fn zero_workers_is_a_config_error() {
        assert!(matches!(
            Scheduler::new(DigestEngine::default(), 0),
            Err(MinerError::ConfigError(_))
        ));
    }

    fn with_failing(workers: usize, failing: &[usize]) -> Scheduler {
        let mut scheduler = Scheduler::new(DigestEngine::default(), workers).unwrap();
        scheduler.failing = failing.to_vec();
        scheduler
    }

    #[test]
    fn unattainable_difficulty_is_exhausted_without_hashing() {
        let scheduler = Scheduler::new(DigestEngine::default(), 2).unwrap();
        for strategy in [SearchStrategy::FirstFound, SearchStrategy::Lowest] {
            let outcome = scheduler
                .search(&template(), 65, NonceRange::up_to(100), strategy)
                .unwrap();
            assert_eq!(outcome, SearchOutcome::Exhausted);
        }
        assert_eq!(scheduler.hash_counter().total(), 0);
    }

    #[test]
    fn parallel_result_satisfies_predicate() {
        let engine = DigestEngine::default();
        for workers in [1, 3, 4] {
            let scheduler = Scheduler::new(engine, workers).unwrap();
            let outcome = scheduler
                .parallel_search(&template(), 3, NonceRange::default())
                .unwrap();
            let solution = outcome.solution().copied().expect("solution");
            assert!(satisfies(&solution.digest_hex(), 3));
            assert_eq!(solution.digest, engine.digest(&template().preimage(solution.nonce)));
            assert_eq!(solution.nonce as usize % workers, solution.worker_id);
        }
    }

    #[test]
    fn lowest_matches_sequential() {
        let engine = DigestEngine::default();
        let (_, expected) = worker::search(&engine, b"scheduler-test", 3, 0, u64::MAX, 1)
            .unwrap()
            .unwrap();
        for workers in [1, 2, 5] {
            let scheduler = Scheduler::new(engine, workers).unwrap();
            let outcome = scheduler
                .lowest_search(&template(), 3, NonceRange::default())
                .unwrap();
            assert_eq!(outcome.solution().map(|s| s.nonce), Some(expected));
        }
    }

    #[test]
    fn exhausted_is_distinct_from_cancelled() {
        let scheduler = Scheduler::new(DigestEngine::default(), 3).unwrap();
        let range = NonceRange::up_to(2_000);
        assert_eq!(
            scheduler.parallel_search(&template(), 64, range).unwrap(),
            SearchOutcome::Exhausted
        );
        assert_eq!(
            scheduler.lowest_search(&template(), 64, range).unwrap(),
            SearchOutcome::Exhausted
        );
        assert_eq!(scheduler.hash_counter().total(), 2 * 2_001);
    }

    #[test]
    fn cancellation_stops_all_workers() {
        let scheduler = Scheduler::new(DigestEngine::default(), 4).unwrap();
        let cancel = scheduler.cancel_handle();
        let counter = scheduler.hash_counter();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            cancel.raise();
        });
        let outcome = scheduler
            .parallel_search(&template(), 64, NonceRange::default())
            .unwrap();
        canceller.join().unwrap();

        assert_eq!(outcome, SearchOutcome::Cancelled);
        let after_return = counter.total();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.total(), after_return, "a worker kept hashing");
    }

    #[test]
    fn success_stops_every_worker() {
        let scheduler = Scheduler::new(DigestEngine::default(), 4).unwrap();
        let counter = scheduler.hash_counter();
        let outcome = scheduler
            .parallel_search(&template(), 3, NonceRange::default())
            .unwrap();
        assert!(outcome.is_found());

        let after_return = counter.total();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.total(), after_return, "a worker kept hashing");
        assert!(!scheduler.cancel_handle().is_raised());
    }

    #[test]
    fn cancelled_lowest_search_does_not_report_unproven_nonce() {
        let engine = DigestEngine::default();
        let scheduler = Scheduler::new(engine, 2).unwrap();
        let state = engine.prepare_template(&template());
        let (_, lowest) = worker::search(&engine, b"scheduler-test", 2, 0, u64::MAX, 1)
            .unwrap()
            .unwrap();

        // Worker 1 finds a later solution and lowers the shared ceiling
        let ceiling = Arc::new(AtomicU64::new(u64::MAX));
        let later = Worker::new(
            1,
            engine,
            state.clone(),
            2,
            Partition::sequential(lowest + 1),
            u64::MAX,
        )
        .with_ceiling(Arc::clone(&ceiling))
        .run();
        let later_nonce = match later {
            WorkerOutcome::Found(solution) => solution.nonce,
            other => panic!("expected a solution, got {:?}", other),
        };
        assert_eq!(ceiling.load(Ordering::SeqCst), later_nonce);

        // The operator cancels before worker 0 reaches the lower solution
        let cancel = StopSignal::new();
        cancel.raise();
        let interrupted =
            Worker::new(0, engine, state.clone(), 2, Partition::sequential(0), u64::MAX)
                .with_ceiling(Arc::clone(&ceiling))
                .with_cancel(cancel)
                .run();
        assert_eq!(interrupted, WorkerOutcome::Halted(0));

        let mut tally = Tally::default();
        tally.record_lowest(Some(later));
        tally.record_lowest(Some(interrupted));
        assert_eq!(
            scheduler.conclude(tally, SearchStrategy::Lowest).unwrap(),
            SearchOutcome::Cancelled
        );

        // Uninterrupted, worker 0 reaches the lower solution under the ceiling
        let finished = Worker::new(0, engine, state, 2, Partition::sequential(0), u64::MAX)
            .with_ceiling(ceiling)
            .run();
        let mut tally = Tally::default();
        tally.record_lowest(Some(later));
        tally.record_lowest(Some(finished));
        let outcome = scheduler.conclude(tally, SearchStrategy::Lowest).unwrap();
        assert_eq!(outcome.solution().map(|s| s.nonce), Some(lowest));
    }

    #[test]
    fn exhaustion_is_decided_by_workers_not_a_late_cancel() {
        let scheduler = Scheduler::new(DigestEngine::default(), 2).unwrap();
        let mut tally = Tally::default();
        tally.record_lowest(Some(WorkerOutcome::Exhausted));
        tally.record_lowest(Some(WorkerOutcome::Exhausted));

        // Raised after every worker finished on its own
        scheduler.cancel_handle().raise();
        assert_eq!(
            scheduler.conclude(tally, SearchStrategy::FirstFound).unwrap(),
            SearchOutcome::Exhausted
        );
    }

    #[test]
    fn one_failed_worker_counts_as_finding_nothing() {
        let scheduler = with_failing(3, &[1]);
        for strategy in [SearchStrategy::FirstFound, SearchStrategy::Lowest] {
            let outcome = scheduler
                .search(&template(), 2, NonceRange::default(), strategy)
                .unwrap();
            let solution = outcome.solution().copied().expect("solution");
            assert!(satisfies(&solution.digest_hex(), 2));
            assert_ne!(solution.worker_id, 1);
        }

        // The failed partition is skipped, the others run to the end
        let outcome = scheduler
            .parallel_search(&template(), 64, NonceRange::up_to(299))
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Exhausted);
    }

    #[test]
    fn all_workers_failing_is_an_error() {
        let scheduler = with_failing(3, &[0, 1, 2]);
        for strategy in [SearchStrategy::FirstFound, SearchStrategy::Lowest] {
            let result = scheduler.search(&template(), 2, NonceRange::default(), strategy);
            assert!(matches!(result, Err(MinerError::WorkerError(_))), "{:?}", strategy);
        }
    }

    #[test]
    fn cancel_before_start_does_no_work() {
        let scheduler = Scheduler::new(DigestEngine::default(), 2).unwrap();
        scheduler.cancel_handle().raise();
        let outcome = scheduler
            .lowest_search(&template(), 1, NonceRange::default())
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Cancelled);
        assert_eq!(scheduler.hash_counter().total(), 0);

        scheduler.cancel_handle().reset();
        assert!(
            scheduler
                .parallel_search(&template(), 1, NonceRange::default())
                .unwrap()
                .is_found()
        );
    }
}
