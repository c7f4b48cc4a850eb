//! RandomPlacement - uniform random choice over the pool.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{AgentName, Job};
use crate::ports::PlacementPolicy;

/// Baseline placement: every agent is equally likely, regardless of load.
pub struct RandomPlacement {
    rng: Mutex<StdRng>,
}

impl RandomPlacement {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of picks for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementPolicy for RandomPlacement {
    fn pick_agent(&self, _job: &Job, pool: &[AgentName]) -> Option<AgentName> {
        if pool.is_empty() {
            return None;
        }
        let idx = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen_range(0..pool.len());
        pool.get(idx).cloned()
    }
}
