// src/miner/worker.rs
//! Sequential nonce search
//!
//! A [`Worker`] walks one arithmetic progression of nonces, hashing each
//! candidate from its own copy of the prepared state and testing it against
//! the difficulty. On its own it is the sequential searcher; the scheduler
//! runs several of them over disjoint [`Partition`]s.

use crate::miner::difficulty::{is_attainable, meets_difficulty};
use crate::miner::digest::{DigestEngine, PreparedState};
use crate::miner::scheduler::{Solution, StopSignal};
use crate::stats::HashCounter;
use crate::utils::error::MinerError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hashes a worker computes between flushes to the shared counter
const COUNTER_FLUSH: u64 = 4096;

/// Inclusive bounds of a search
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NonceRange {
    /// First nonce of the search
    pub start_nonce: u64,
    /// Last nonce that may be tested (inclusive)
    pub max_nonce: u64,
}

impl NonceRange {
    /// Creates a range, rejecting `start_nonce > max_nonce`
    pub fn new(start_nonce: u64, max_nonce: u64) -> Result<Self, MinerError> {
        if start_nonce > max_nonce {
            return Err(MinerError::ConfigError(format!(
                "Start nonce {} is above max nonce {}",
                start_nonce, max_nonce
            )));
        }
        Ok(Self {
            start_nonce,
            max_nonce,
        })
    }

    /// `[0, max_nonce]`
    pub fn up_to(max_nonce: u64) -> Self {
        Self {
            start_nonce: 0,
            max_nonce,
        }
    }
}

impl Default for NonceRange {
    fn default() -> Self {
        Self::up_to(u64::MAX)
    }
}

/// Arithmetic progression of nonces assigned to one worker
///
/// Worker `offset` examines `start_nonce + offset`, then every `stride`-th
/// nonce after it. With `stride = N` and offsets `0..N` the partitions are
/// disjoint and together cover the range exactly once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    /// Base of the whole search
    pub start_nonce: u64,
    /// Position of this worker's first nonce relative to the base
    pub offset: u64,
    /// Distance between consecutive nonces; zero is treated as one
    pub stride: u64,
}

impl Partition {
    /// Every nonce from `start_nonce` upwards
    pub fn sequential(start_nonce: u64) -> Self {
        Self {
            start_nonce,
            offset: 0,
            stride: 1,
        }
    }

    /// Partition of worker `worker_id` out of `worker_count`
    pub fn for_worker(start_nonce: u64, worker_id: usize, worker_count: usize) -> Self {
        Self {
            start_nonce,
            offset: worker_id as u64,
            stride: worker_count as u64,
        }
    }

    /// Nonces of this partition up to and including `max_nonce`
    pub fn nonces(&self, max_nonce: u64) -> Nonces {
        Nonces {
            next: self.start_nonce.checked_add(self.offset),
            stride: self.stride.max(1),
            max_nonce,
        }
    }
}

/// Iterator over a partition; stops instead of overflowing
#[derive(Clone, Debug)]
pub struct Nonces {
    next: Option<u64>,
    stride: u64,
    max_nonce: u64,
}

impl Iterator for Nonces {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let nonce = self.next.filter(|n| *n <= self.max_nonce)?;
        self.next = nonce.checked_add(self.stride);
        Some(nonce)
    }
}

/// How a worker's run ended
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// A nonce met the difficulty
    Found(Solution),
    /// The partition was walked to `max_nonce` without a match
    Exhausted,
    /// A stop signal or the lowest-nonce ceiling ended the run early;
    /// holds the first nonce of the partition that was not examined
    Halted(u64),
}

/// Single-threaded searcher over one partition
pub struct Worker {
    id: usize,
    engine: DigestEngine,
    state: PreparedState,
    difficulty: u32,
    partition: Partition,
    max_nonce: u64,
    counter: HashCounter,
    cancel: StopSignal,
    found: StopSignal,
    ceiling: Option<Arc<AtomicU64>>,
    #[cfg(test)]
    panics: bool,
}

impl Worker {
    /// Creates a worker that owns `state`
    pub fn new(
        id: usize,
        engine: DigestEngine,
        state: PreparedState,
        difficulty: u32,
        partition: Partition,
        max_nonce: u64,
    ) -> Self {
        Worker {
            id,
            engine,
            state,
            difficulty,
            partition,
            max_nonce,
            counter: HashCounter::default(),
            cancel: StopSignal::new(),
            found: StopSignal::new(),
            ceiling: None,
            #[cfg(test)]
            panics: false,
        }
    }

    /// Reports hashes into `counter`
    pub fn with_counter(mut self, counter: HashCounter) -> Self {
        self.counter = counter;
        self
    }

    /// Stops when the operator raises `cancel`
    pub fn with_cancel(mut self, cancel: StopSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stops when another worker raises `found`; raises it on success
    pub fn with_found_signal(mut self, found: StopSignal) -> Self {
        self.found = found;
        self
    }

    /// Stops once the next candidate is above the lowest nonce found so far
    /// by any worker sharing `ceiling`; lowers it on success
    pub fn with_ceiling(mut self, ceiling: Arc<AtomicU64>) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Makes `run` panic, standing in for a worker that fails
    #[cfg(test)]
    pub(crate) fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Identifier reported in solutions
    pub fn id(&self) -> usize {
        self.id
    }

    /// Walks the partition until a solution, exhaustion, or a halt
    ///
    /// Within one run nonces are tested in strictly increasing order, so a
    /// `Found` result is the lowest satisfying nonce of the partition that
    /// was reached.
    pub fn run(&self) -> WorkerOutcome {
        #[cfg(test)]
        if self.panics {
            panic!("worker {} failed", self.id);
        }

        let mut buf = itoa::Buffer::new();
        let mut pending = 0u64;
        let mut outcome = WorkerOutcome::Exhausted;

        for nonce in self.partition.nonces(self.max_nonce) {
            if self.should_halt(nonce) {
                outcome = WorkerOutcome::Halted(nonce);
                break;
            }

            let digest = self
                .engine
                .extend_and_digest(&self.state, buf.format(nonce).as_bytes());
            pending += 1;

            if meets_difficulty(&digest, self.difficulty) {
                self.found.raise();
                if let Some(ceiling) = &self.ceiling {
                    ceiling.fetch_min(nonce, Ordering::SeqCst);
                }
                outcome = WorkerOutcome::Found(Solution {
                    nonce,
                    digest,
                    worker_id: self.id,
                });
                break;
            }

            if pending == COUNTER_FLUSH {
                self.counter.add(pending);
                pending = 0;
            }
        }

        self.counter.add(pending);
        outcome
    }

    #[inline]
    fn should_halt(&self, nonce: u64) -> bool {
        self.cancel.is_raised()
            || self.found.is_raised()
            || self
                .ceiling
                .as_ref()
                .is_some_and(|c| nonce > c.load(Ordering::Relaxed))
    }
}

/// Sequential search over `prefix || decimal(nonce)`
///
/// Tests `start_nonce, start_nonce + stride, ...` up to and including
/// `max_nonce` and returns the first `(digest_hex, nonce)` whose digest
/// meets `difficulty`, or `None` once the range is exhausted. A difficulty
/// above 64 hex digits is never met and returns `None` without hashing.
pub fn search(
    engine: &DigestEngine,
    prefix: &[u8],
    difficulty: u32,
    start_nonce: u64,
    max_nonce: u64,
    stride: u64,
) -> Result<Option<(String, u64)>, MinerError> {
    if !is_attainable(difficulty) {
        return Ok(None);
    }
    let partition = Partition {
        start_nonce,
        offset: 0,
        stride,
    };
    let worker = Worker::new(
        0,
        *engine,
        engine.prepare(prefix),
        difficulty,
        partition,
        max_nonce,
    );
    Ok(match worker.run() {
        WorkerOutcome::Found(solution) => Some((solution.digest.to_hex(), solution.nonce)),
        WorkerOutcome::Exhausted | WorkerOutcome::Halted(_) => None,
    })
}
