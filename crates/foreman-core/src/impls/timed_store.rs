//! TimedStore - per-call timeout around any `JobStore`.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Job, JobKey, StoreError};
use crate::ports::JobStore;

/// Bounds every store call by `timeout`; an elapsed call becomes
/// `StoreError::Timeout`, which callers treat as transient.
pub struct TimedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: JobStore> TimedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

#[async_trait]
impl<S: JobStore> JobStore for TimedStore<S> {
    async fn get(&self, key: &JobKey) -> Result<Job, StoreError> {
        self.bounded(self.inner.get(key)).await
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Job>, StoreError> {
        self.bounded(self.inner.list(namespace)).await
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        self.bounded(self.inner.update(job)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryJobStore;

    struct StalledStore;

    #[async_trait]
    impl JobStore for StalledStore {
        async fn get(&self, _key: &JobKey) -> Result<Job, StoreError> {
            std::future::pending().await
        }

        async fn list(&self, _namespace: &str) -> Result<Vec<Job>, StoreError> {
            std::future::pending().await
        }

        async fn update(&self, _job: &Job) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_times_out() {
        let store = TimedStore::new(StalledStore, Duration::from_millis(50));
        let err = store.list("default").await.unwrap_err();
        assert_eq!(err, StoreError::Timeout(Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let store = TimedStore::new(InMemoryJobStore::new(), Duration::from_secs(1));
        store.inner().create(Job::new("default", "a")).await.unwrap();

        let job = store.get(&JobKey::new("default", "a")).await.unwrap();
        assert_eq!(job.name(), "a");
        let err = store.get(&JobKey::new("default", "b")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
