//! Scheduler - places an unassigned job on one agent of the pool.
//!
//! The assignment is handed to the caller to persist before the job is
//! enqueued. Once a worker can see the job, the scheduler's side never writes
//! it again, so a worker's `Pending` cannot be overwritten by a stale copy.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::queue::AgentQueue;
use crate::domain::{AgentName, Job, JobEvent, Reason};
use crate::ports::{EventSink, PlacementPolicy};

pub struct Scheduler {
    pool: Vec<Arc<AgentQueue>>,
    names: Vec<AgentName>,
    placement: Arc<dyn PlacementPolicy>,
    events: Arc<dyn EventSink>,

    /// Serializes "already queued?", persist and enqueue so overlapping
    /// reconciles of one key cannot land it on two agents.
    assign_lock: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        pool: Vec<Arc<AgentQueue>>,
        placement: Arc<dyn PlacementPolicy>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let names = pool.iter().map(|q| q.agent().clone()).collect();
        Self {
            pool,
            names,
            placement,
            events,
            assign_lock: Mutex::new(()),
        }
    }

    pub fn agents(&self) -> &[AgentName] {
        &self.names
    }

    pub fn queues(&self) -> &[Arc<AgentQueue>] {
        &self.pool
    }

    pub fn queue(&self, agent: &AgentName) -> Option<&Arc<AgentQueue>> {
        self.pool.iter().find(|q| q.agent() == agent)
    }

    /// Place `job` on an agent and hand it over to that agent's queue,
    /// without persisting anything.
    pub async fn assign(&self, job: &Job) -> Option<AgentName> {
        self.assign_with(job, |_| async {}).await
    }

    /// Place `job` on an agent, run `persist` on the assigned copy, then
    /// hand that copy over to the agent's queue.
    ///
    /// If the job is already queued on some agent (a redelivered notification
    /// whose earlier assignment was not persisted) that agent is returned and
    /// neither `persist` nor enqueue runs. The queued copy carries the agent
    /// and the owning worker's next write stores it.
    pub async fn assign_with<F, Fut>(&self, job: &Job, persist: F) -> Option<AgentName>
    where
        F: FnOnce(Job) -> Fut,
        Fut: Future<Output = ()>,
    {
        let _guard = self.assign_lock.lock().await;
        let key = job.key();

        for queue in &self.pool {
            if queue.contains(&key).await {
                tracing::debug!(job = %key, agent = %queue.agent(), "job already queued");
                return Some(queue.agent().clone());
            }
        }

        let Some(agent) = self.placement.pick_agent(job, &self.names) else {
            tracing::error!(job = %key, "placement returned no agent");
            return None;
        };
        let Some(queue) = self.queue(&agent) else {
            tracing::error!(job = %key, agent = %agent, "placement picked an agent outside the pool");
            return None;
        };

        let mut owned = job.clone();
        owned.assign(agent.clone());
        persist(owned.clone()).await;
        queue.enqueue(owned).await;

        self.events
            .record(JobEvent::normal(job, Reason::Pending, "Job Pending"));
        tracing::info!(job = %key, agent = %agent, "job scheduled");
        Some(agent)
    }
}
