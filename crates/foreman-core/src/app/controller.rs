//! ReconcileController - entry point per change notification.

use std::sync::Arc;

use super::scheduler::Scheduler;
use crate::domain::{AgentName, Job, JobKey, ReconcileError};
use crate::ports::JobStore;

/// What a reconcile did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The job no longer exists.
    NotFound,

    /// The job was placed on this agent.
    Scheduled(AgentName),

    /// The job already had an agent.
    AlreadyAssigned(AgentName),
}

pub struct ReconcileController {
    store: Arc<dyn JobStore>,
    scheduler: Arc<Scheduler>,
}

impl ReconcileController {
    pub fn new(store: Arc<dyn JobStore>, scheduler: Arc<Scheduler>) -> Self {
        Self { store, scheduler }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Fetch `key` and schedule it if it has no agent yet.
    ///
    /// The assignment is written before the job reaches the agent's queue, so
    /// this write never races the worker. An error means the key should be
    /// delivered again. Failing to persist the assignment is only logged: the
    /// queued copy carries the agent, and a redelivered key gets the same
    /// agent back.
    pub async fn reconcile(&self, key: &JobKey) -> Result<ReconcileOutcome, ReconcileError> {
        let job = match self.store.get(key).await {
            Ok(job) => job,
            Err(err) if err.is_not_found() => {
                tracing::debug!(job = %key, "job not found, nothing to reconcile");
                return Ok(ReconcileOutcome::NotFound);
            }
            Err(source) => {
                tracing::warn!(job = %key, error = %source, "failed to fetch job");
                return Err(ReconcileError::Fetch {
                    key: key.clone(),
                    source,
                });
            }
        };

        if let Some(agent) = job.agent().filter(|_| job.is_assigned()) {
            return Ok(ReconcileOutcome::AlreadyAssigned(agent.clone()));
        }

        let agent = self
            .scheduler
            .assign_with(&job, |assigned| async move {
                self.persist_assignment(&assigned).await
            })
            .await
            .ok_or_else(|| ReconcileError::NoAgent(key.clone()))?;
        Ok(ReconcileOutcome::Scheduled(agent))
    }

    async fn persist_assignment(&self, job: &Job) {
        let key = job.key();
        let agent = job.agent().map(AgentName::as_str).unwrap_or_default();
        match self.store.update(job).await {
            Ok(()) => tracing::info!(job = %key, agent, "assigned job to agent"),
            Err(err) => tracing::error!(
                job = %key,
                agent,
                error = %err,
                "failed to persist agent assignment"
            ),
        }
    }
}
