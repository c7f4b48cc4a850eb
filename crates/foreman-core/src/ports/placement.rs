//! PlacementPolicy port - which agent gets a job.

use crate::domain::{AgentName, Job};

/// Picks one agent from the pool for an unassigned job.
///
/// Returns `None` only when `pool` is empty or the policy refuses the job.
pub trait PlacementPolicy: Send + Sync {
    fn pick_agent(&self, job: &Job, pool: &[AgentName]) -> Option<AgentName>;
}
