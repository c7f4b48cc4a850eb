//! AgentQueue - the jobs one agent is responsible for.
//!
//! # Ownership
//! - The scheduler hands a job over with `enqueue` and never touches it again
//! - From then on only the owning worker reads, writes back and removes it
//! - A key is queued at most once per agent; enqueueing it again is a no-op
//!
//! # Contents
//! Entries are the worker's latest copy of each job, which can run ahead of
//! the store when a write failed. A job stays until the store holds its final
//! state, so a `Succeeded` or exhausted `Failed` entry may linger for a few
//! cycles while its write is retried.
//!
//! # Locking
//! All access goes through one `tokio::sync::Mutex`. The lock is never held
//! across an `.await` outside this module, and `snapshot` hands out detached
//! copies so a cycle never works under the lock.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::status::AgentStatus;
use crate::domain::{AgentName, Job, JobKey, JobState};

pub struct AgentQueue {
    agent: AgentName,
    jobs: Mutex<HashMap<JobKey, Job>>,
}

impl AgentQueue {
    pub fn new(agent: AgentName) -> Self {
        Self {
            agent,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn agent(&self) -> &AgentName {
        &self.agent
    }

    /// Hand a job over to this agent. A key that is already queued is left
    /// untouched and `false` is returned.
    pub async fn enqueue(&self, job: Job) -> bool {
        let mut jobs = self.jobs.lock().await;
        let key = job.key();
        if jobs.contains_key(&key) {
            return false;
        }
        jobs.insert(key, job);
        true
    }

    /// Copy of the current contents, ordered by key.
    pub async fn snapshot(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.lock().await.values().cloned().collect();
        jobs.sort_by_key(|j| j.key());
        jobs
    }

    /// Write back the worker's copy of a job. Ignored if the job has left the
    /// queue in the meantime.
    pub async fn put_back(&self, job: Job) {
        let mut jobs = self.jobs.lock().await;
        if let Some(slot) = jobs.get_mut(&job.key()) {
            *slot = job;
        }
    }

    pub async fn remove(&self, key: &JobKey) -> Option<Job> {
        self.jobs.lock().await.remove(key)
    }

    pub async fn get(&self, key: &JobKey) -> Option<Job> {
        self.jobs.lock().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &JobKey) -> bool {
        self.jobs.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    pub async fn status(&self) -> AgentStatus {
        let jobs = self.jobs.lock().await;
        let mut status = AgentStatus::new(self.agent.clone());
        for job in jobs.values() {
            status.queued += 1;
            match job.state() {
                JobState::Unset => status.unset += 1,
                JobState::Pending => status.pending += 1,
                JobState::Failed => status.failed += 1,
                // waiting for its final write; counted in `queued` only
                JobState::Succeeded => {}
            }
        }
        status
    }
}
