//! DependencyResolver - has every job named in `dependsOn` succeeded?
//!
//! # Lookup
//! Dependencies are looked up by name inside the dependent's namespace with a
//! linear scan over `list(namespace)`. There is no index; job counts are
//! small. Only the store is consulted, never another agent's queue, so a
//! dependency counts as succeeded once that state has been persisted.
//!
//! # Order
//! `dependsOn` is checked in declaration order and the first blocker wins.
//! That blocker is what the worker reports in its `Pending` warning.
//!
//! # Outcomes
//! - `Ready`: nothing declared, or every dependency succeeded (or was ignored)
//! - `AlreadySucceeded`: the job itself is done; nothing to run
//! - `Blocked`: a dependency has not succeeded, or is missing under
//!   `MissingDependencyPolicy::Block`
//! - `Unresolved`: `list` failed; the job just waits for the next cycle
//!
//! # Missing dependencies
//! Ignored by default and logged at error level. Cycles between jobs are not
//! detected; such jobs stay blocked.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{Job, JobState, StoreError};
use crate::ports::JobStore;

/// How a dependency that does not exist in the store is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDependencyPolicy {
    /// Log it and move on to the next dependency.
    #[default]
    Ignore,

    /// Treat it like an unfinished dependency.
    Block,
}

/// Why a job may not run yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    /// The dependency exists but is not `Succeeded`.
    NotSucceeded { dependency: String, state: JobState },

    /// The dependency does not exist and the policy is `Block`.
    Missing { dependency: String },
}

impl Blocker {
    pub fn dependency(&self) -> &str {
        match self {
            Blocker::NotSucceeded { dependency, .. } | Blocker::Missing { dependency } => dependency,
        }
    }
}

/// Result of a readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// All dependencies satisfied (or ignored).
    Ready,

    /// The job itself already succeeded; nothing left to run.
    AlreadySucceeded,

    /// The first dependency found not satisfied.
    Blocked(Blocker),

    /// The namespace could not be listed; readiness is unknown this cycle.
    Unresolved(StoreError),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

pub struct DependencyResolver {
    store: Arc<dyn JobStore>,
    missing: MissingDependencyPolicy,
}

impl DependencyResolver {
    pub fn new(store: Arc<dyn JobStore>, missing: MissingDependencyPolicy) -> Self {
        Self { store, missing }
    }

    pub fn missing_policy(&self) -> MissingDependencyPolicy {
        self.missing
    }

    /// `true` only when the job may execute now.
    pub async fn ready(&self, job: &Job) -> bool {
        self.check(job).await.is_ready()
    }

    /// Check dependencies in declaration order and stop at the first blocker.
    pub async fn check(&self, job: &Job) -> Readiness {
        if job.state() == JobState::Succeeded {
            return Readiness::AlreadySucceeded;
        }
        if job.spec.depends_on.is_empty() {
            return Readiness::Ready;
        }

        let siblings = match self.store.list(job.namespace()).await {
            Ok(jobs) => jobs,
            Err(err) => {
                tracing::error!(
                    job = %job.key(),
                    error = %err,
                    "failed to list jobs while resolving dependencies"
                );
                return Readiness::Unresolved(err);
            }
        };

        for dependency in &job.spec.depends_on {
            match siblings.iter().find(|j| j.name() == dependency) {
                Some(dep) if dep.state() == JobState::Succeeded => {}
                Some(dep) => {
                    tracing::info!(
                        job = %job.key(),
                        dependency = %dependency,
                        state = %dep.state(),
                        "dependent job has not succeeded"
                    );
                    return Readiness::Blocked(Blocker::NotSucceeded {
                        dependency: dependency.clone(),
                        state: dep.state(),
                    });
                }
                None => {
                    tracing::error!(
                        job = %job.key(),
                        dependency = %dependency,
                        policy = ?self.missing,
                        "could not find dependency in namespace"
                    );
                    if self.missing == MissingDependencyPolicy::Block {
                        return Readiness::Blocked(Blocker::Missing {
                            dependency: dependency.clone(),
                        });
                    }
                }
            }
        }
        Readiness::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryJobStore, StoreOp};

    async fn store_with(jobs: Vec<Job>) -> Arc<InMemoryJobStore> {
        let store = Arc::new(InMemoryJobStore::new());
        for job in jobs {
            store.create(job).await.unwrap();
        }
        store
    }

    fn in_state(mut job: Job, state: JobState) -> Job {
        job.status.state = state;
        job
    }

    fn resolver(store: &Arc<InMemoryJobStore>, missing: MissingDependencyPolicy) -> DependencyResolver {
        DependencyResolver::new(store.clone(), missing)
    }

    #[tokio::test]
    async fn no_dependencies_is_ready() {
        let store = store_with(vec![]).await;
        let job = in_state(Job::new("default", "a"), JobState::Pending);
        assert!(resolver(&store, MissingDependencyPolicy::Ignore).ready(&job).await);
    }

    #[tokio::test]
    async fn succeeded_job_is_never_ready() {
        let store = store_with(vec![]).await;
        let job = in_state(Job::new("default", "a"), JobState::Succeeded);
        let r = resolver(&store, MissingDependencyPolicy::Ignore);
        assert_eq!(r.check(&job).await, Readiness::AlreadySucceeded);
    }

    #[tokio::test]
    async fn unfinished_dependency_blocks() {
        let store = store_with(vec![in_state(Job::new("default", "a"), JobState::Pending)]).await;
        let job = Job::new("default", "b").with_depends_on(["a"]);

        let readiness = resolver(&store, MissingDependencyPolicy::Ignore).check(&job).await;
        assert_eq!(
            readiness,
            Readiness::Blocked(Blocker::NotSucceeded {
                dependency: "a".into(),
                state: JobState::Pending,
            })
        );
    }

    #[tokio::test]
    async fn failed_dependency_blocks() {
        let store = store_with(vec![in_state(Job::new("default", "a"), JobState::Failed)]).await;
        let job = Job::new("default", "b").with_depends_on(["a"]);
        assert!(!resolver(&store, MissingDependencyPolicy::Ignore).ready(&job).await);
    }

    #[tokio::test]
    async fn all_succeeded_dependencies_are_ready() {
        let store = store_with(vec![
            in_state(Job::new("default", "a"), JobState::Succeeded),
            in_state(Job::new("default", "b"), JobState::Succeeded),
        ])
        .await;
        let job = Job::new("default", "c").with_depends_on(["a", "b"]);
        assert!(resolver(&store, MissingDependencyPolicy::Ignore).ready(&job).await);
    }

    #[tokio::test]
    async fn first_blocker_in_declaration_order_is_reported() {
        let store = store_with(vec![
            in_state(Job::new("default", "a"), JobState::Succeeded),
            in_state(Job::new("default", "b"), JobState::Unset),
            in_state(Job::new("default", "c"), JobState::Pending),
        ])
        .await;
        let job = Job::new("default", "d").with_depends_on(["a", "c", "b"]);
        match resolver(&store, MissingDependencyPolicy::Ignore).check(&job).await {
            Readiness::Blocked(blocker) => assert_eq!(blocker.dependency(), "c"),
            other => panic!("expected blocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dependency_in_other_namespace_does_not_count() {
        let store = store_with(vec![in_state(Job::new("other", "a"), JobState::Succeeded)]).await;
        let job = Job::new("default", "b").with_depends_on(["a"]);

        let ignore = resolver(&store, MissingDependencyPolicy::Ignore);
        assert!(ignore.ready(&job).await);

        let block = resolver(&store, MissingDependencyPolicy::Block);
        assert_eq!(
            block.check(&job).await,
            Readiness::Blocked(Blocker::Missing { dependency: "a".into() })
        );
    }

    #[tokio::test]
    async fn missing_dependency_is_ignored_by_default() {
        let store = store_with(vec![in_state(Job::new("default", "a"), JobState::Succeeded)]).await;
        let job = Job::new("default", "c").with_depends_on(["ghost", "a"]);
        assert!(resolver(&store, MissingDependencyPolicy::default()).ready(&job).await);
    }

    #[tokio::test]
    async fn list_failure_is_unresolved() {
        let store = store_with(vec![]).await;
        store.fail(StoreOp::List, StoreError::Unavailable("down".into()));
        let job = Job::new("default", "b").with_depends_on(["a"]);

        let readiness = resolver(&store, MissingDependencyPolicy::Ignore).check(&job).await;
        assert!(matches!(readiness, Readiness::Unresolved(StoreError::Unavailable(_))));
        assert!(!readiness.is_ready());

        // a job without dependencies never touches the store
        let free = Job::new("default", "free");
        assert!(resolver(&store, MissingDependencyPolicy::Ignore).ready(&free).await);
    }
}
