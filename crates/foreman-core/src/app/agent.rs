//! AgentWorker - drives one agent's queue through the job state machine.
//!
//! # Cycle
//! - Take a snapshot of the queue, sorted by key
//! - `Unset`: mark `Pending`, write back, persist (no execution this cycle)
//! - `Pending` / `Failed`: ask the resolver; execute when every dependency
//!   has succeeded, otherwise emit a `Pending` warning and wait
//! - After execution: even result -> `Succeeded`, odd -> `Failed`
//! - Sleep `poll_interval`, or stop when cancelled
//!
//! # Write order
//! The worker mutates its own copy of a job, writes it back into the queue
//! first and persists second. A failed store write never rolls back the
//! in-memory transition.
//!
//! # Leaving the queue
//! A job leaves the queue only after the store has accepted its final state
//! (`Succeeded`, or `Failed` past the backoff limit under
//! `RetryPolicy::BackoffLimit`). Until then it stays queued and each cycle
//! writes it again without executing it. Dependents read the store, so they
//! are released only once that write lands.
//!
//! # Events
//! `Succeeded`, `Failed` and `BackoffLimitExceeded` are recorded once, at the
//! transition. Retried writes record nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::queue::AgentQueue;
use super::resolver::{Blocker, DependencyResolver, MissingDependencyPolicy, Readiness};
use super::retry::RetryPolicy;
use crate::domain::{AgentName, Job, JobEvent, JobState, Reason};
use crate::ports::{EventSink, Executor, JobStore};

/// Default pause between two cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// What one cycle did. Used for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Unset -> Pending.
    pub promoted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub blocked: usize,

    /// Failed jobs taken out of the queue by the retry policy.
    pub dropped: usize,
}

impl CycleReport {
    fn is_quiet(&self) -> bool {
        *self == CycleReport::default()
    }
}

pub struct AgentWorker {
    queue: Arc<AgentQueue>,
    store: Arc<dyn JobStore>,
    events: Arc<dyn EventSink>,
    executor: Arc<dyn Executor>,
    resolver: DependencyResolver,
    retry: RetryPolicy,
    poll_interval: Duration,
}

impl AgentWorker {
    pub fn new(
        queue: Arc<AgentQueue>,
        store: Arc<dyn JobStore>,
        events: Arc<dyn EventSink>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let resolver = DependencyResolver::new(store.clone(), MissingDependencyPolicy::default());
        Self {
            queue,
            store,
            events,
            executor,
            resolver,
            retry: RetryPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_missing_dependency(mut self, policy: MissingDependencyPolicy) -> Self {
        self.resolver = DependencyResolver::new(self.store.clone(), policy);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn agent(&self) -> &AgentName {
        self.queue.agent()
    }

    /// Run cycles until `cancel` fires. Cancellation is observed between
    /// cycles, between jobs and during simulated execution.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(agent = %self.agent(), interval = ?self.poll_interval, "agent worker started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.run_cycle(&cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        tracing::info!(agent = %self.agent(), "agent worker stopped");
    }

    /// One pass over a snapshot of the queue.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        for job in self.queue.snapshot().await {
            if cancel.is_cancelled() {
                break;
            }
            self.advance(job, cancel, &mut report).await;
        }
        if !report.is_quiet() {
            tracing::debug!(agent = %self.agent(), ?report, "cycle finished");
        }
        report
    }

    async fn advance(&self, mut job: Job, cancel: &CancellationToken, report: &mut CycleReport) {
        match job.state() {
            JobState::Unset => {
                if let Err(err) = job.mark_pending() {
                    tracing::error!(agent = %self.agent(), error = %err, "cannot mark job pending");
                    return;
                }
                self.queue.put_back(job.clone()).await;
                self.persist(&job).await;
                report.promoted += 1;
            }
            // finished earlier, but the store has not accepted it yet
            JobState::Succeeded => self.settle(&job).await,
            JobState::Failed if !self.retry.keep_queued(&job) => self.settle(&job).await,
            JobState::Pending | JobState::Failed => match self.resolver.check(&job).await {
                Readiness::Ready => self.execute(job, cancel, report).await,
                Readiness::AlreadySucceeded => self.settle(&job).await,
                Readiness::Blocked(blocker) => {
                    self.events.record(JobEvent::warning(
                        &job,
                        Reason::Pending,
                        blocked_message(&blocker),
                    ));
                    report.blocked += 1;
                }
                // logged by the resolver; try again next cycle
                Readiness::Unresolved(_) => {}
            },
        }
    }

    async fn execute(&self, mut job: Job, cancel: &CancellationToken, report: &mut CycleReport) {
        let key = job.key();
        let Some(result) = self.executor.execute(&job, cancel).await else {
            tracing::debug!(agent = %self.agent(), job = %key, "execution cancelled");
            return;
        };

        let state = match job.record_result(result) {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(agent = %self.agent(), error = %err, "cannot record result");
                return;
            }
        };
        self.queue.put_back(job.clone()).await;

        match state {
            JobState::Succeeded => {
                tracing::info!(agent = %self.agent(), job = %key, result, "job succeeded");
                self.events.record(JobEvent::normal(
                    &job,
                    Reason::Succeeded,
                    format!("Job Succeeded, result:{result}"),
                ));
                report.succeeded += 1;
                self.settle(&job).await;
            }
            _ => {
                tracing::warn!(
                    agent = %self.agent(),
                    job = %key,
                    result,
                    failures = job.status.failed,
                    "job failed"
                );
                self.events.record(JobEvent::warning(
                    &job,
                    Reason::Failed,
                    format!("Job Failed, result:{result}"),
                ));
                report.failed += 1;

                if self.retry.keep_queued(&job) {
                    self.persist(&job).await;
                } else {
                    self.events.record(JobEvent::warning(
                        &job,
                        Reason::BackoffLimitExceeded,
                        format!(
                            "Job has reached the specified backoff limit, failed:{}",
                            job.status.failed
                        ),
                    ));
                    report.dropped += 1;
                    self.settle(&job).await;
                }
            }
        }
    }

    /// Persist a job that is done with this agent and let it go. The job
    /// only leaves the queue once the store holds its final state; on a
    /// failed write it stays and the next cycle writes it again.
    async fn settle(&self, job: &Job) {
        if self.persist(job).await {
            self.queue.remove(&job.key()).await;
        }
    }

    async fn persist(&self, job: &Job) -> bool {
        match self.store.update(job).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    agent = %self.agent(),
                    job = %job.key(),
                    state = %job.state(),
                    error = %err,
                    "failed to persist job status"
                );
                false
            }
        }
    }
}

fn blocked_message(blocker: &Blocker) -> String {
    match blocker {
        Blocker::NotSucceeded { dependency, .. } => {
            format!("Dependent Job is not succeeded, job:{dependency}")
        }
        Blocker::Missing { dependency } => format!("Dependent Job not found, job:{dependency}"),
    }
}
