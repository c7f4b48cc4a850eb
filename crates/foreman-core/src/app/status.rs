//! Per-agent queue counts for observability.

use serde::{Deserialize, Serialize};

use crate::domain::AgentName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent: AgentName,

    /// Jobs currently in the agent's queue.
    pub queued: usize,
    pub unset: usize,
    pub pending: usize,

    /// Failed jobs still queued for another attempt.
    pub failed: usize,
}

impl AgentStatus {
    pub fn new(agent: AgentName) -> Self {
        Self {
            agent,
            queued: 0,
            unset: 0,
            pending: 0,
            failed: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.queued == 0
    }
}
