//! JobStore port - the durable source of truth for jobs.
//!
//! The core keeps jobs in memory as a cache only; every transition is written
//! back through this trait and the store wins on disagreement.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Job, JobKey, StoreError};

/// Read/write access to job objects.
///
/// Implementations must be safe to call concurrently from the reconcile
/// controller and every agent worker.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch one job. Missing jobs yield `StoreError::NotFound`.
    async fn get(&self, key: &JobKey) -> Result<Job, StoreError>;

    /// All jobs in `namespace`, in no particular order.
    async fn list(&self, namespace: &str) -> Result<Vec<Job>, StoreError>;

    /// Replace the stored object with `job`.
    async fn update(&self, job: &Job) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: JobStore + ?Sized> JobStore for Arc<S> {
    async fn get(&self, key: &JobKey) -> Result<Job, StoreError> {
        (**self).get(key).await
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Job>, StoreError> {
        (**self).list(namespace).await
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        (**self).update(job).await
    }
}
