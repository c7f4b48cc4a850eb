//! Executors: a random simulation and a scripted one for tests.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;

use crate::domain::Job;
use crate::ports::Executor;

/// Sleeps a random delay, then draws a result in `0..result_bound`.
pub struct SimulatedExecutor {
    rng: Mutex<StdRng>,
    delay_ms: Range<u64>,
    result_bound: i32,
}

impl SimulatedExecutor {
    /// `delay_ms` must be non-empty and `result_bound` positive.
    pub fn new(rng: StdRng, delay_ms: Range<u64>, result_bound: i32) -> Self {
        Self {
            rng: Mutex::new(rng),
            delay_ms,
            result_bound,
        }
    }

    pub fn seeded(seed: u64, delay_ms: Range<u64>, result_bound: i32) -> Self {
        Self::new(StdRng::seed_from_u64(seed), delay_ms, result_bound)
    }

    pub fn from_entropy(delay_ms: Range<u64>, result_bound: i32) -> Self {
        Self::new(StdRng::from_entropy(), delay_ms, result_bound)
    }

    /// Delay and result for one run. Both come from one lock so a seeded
    /// executor is reproducible per call order.
    fn draw(&self) -> (Duration, i32) {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let delay = if self.delay_ms.is_empty() {
            self.delay_ms.start
        } else {
            rng.gen_range(self.delay_ms.clone())
        };
        let result = rng.gen_range(0..self.result_bound.max(1));
        (Duration::from_millis(delay), result)
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    async fn execute(&self, job: &Job, cancel: &CancellationToken) -> Option<i32> {
        let (delay, result) = self.draw();
        tracing::debug!(job = %job.key(), ?delay, "simulating execution");
        tokio::select! {
            _ = cancel.cancelled() => None,
            _ = tokio::time::sleep(delay) => Some(result),
        }
    }
}

/// Replays a fixed list of result codes, then repeats the last one.
#[derive(Debug)]
pub struct ScriptedExecutor {
    results: Mutex<VecDeque<i32>>,
    last: Mutex<i32>,
}

impl ScriptedExecutor {
    pub fn new(results: impl IntoIterator<Item = i32>) -> Self {
        let results: VecDeque<i32> = results.into_iter().collect();
        let last = results.back().copied().unwrap_or(0);
        Self {
            results: Mutex::new(results),
            last: Mutex::new(last),
        }
    }

    /// Always produces `result`.
    pub fn always(result: i32) -> Self {
        Self::new([result])
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, _job: &Job, cancel: &CancellationToken) -> Option<i32> {
        if cancel.is_cancelled() {
            return None;
        }
        let next = self
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(result) = next {
            *last = result;
        }
        Some(*last)
    }
}
