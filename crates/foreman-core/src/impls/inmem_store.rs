//! InMemoryJobStore - development store with change notifications.
//!
//! Every create/update pushes the job's key to each subscriber, including
//! updates written by the controller itself, so consumers see at-least-once
//! (and frequently duplicate) delivery.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{Job, JobKey, JobUid, StoreError};
use crate::ports::JobStore;

/// Store operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    List,
    Update,
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Arc<Mutex<BTreeMap<JobKey, Job>>>,
    subscribers: StdMutex<Vec<mpsc::UnboundedSender<JobKey>>>,
    failures: StdMutex<HashMap<StoreOp, StoreError>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register for change notifications.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<JobKey> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_subscribers().push(tx);
        rx
    }

    /// Insert a new job, assigning it a uid. Fails if the key exists.
    pub async fn create(&self, mut job: Job) -> Result<Job, StoreError> {
        let key = job.key();
        {
            let mut jobs = self.jobs.lock().await;
            if jobs.contains_key(&key) {
                return Err(StoreError::Conflict(key));
            }
            job.metadata.uid = Some(JobUid::new());
            jobs.insert(key.clone(), job.clone());
        }
        self.notify(&key);
        Ok(job)
    }

    /// Every job across all namespaces, ordered by key.
    pub async fn snapshot(&self) -> Vec<Job> {
        self.jobs.lock().await.values().cloned().collect()
    }

    /// Make every call of `op` fail with `err` until cleared.
    pub fn fail(&self, op: StoreOp, err: StoreError) {
        self.lock_failures().insert(op, err);
    }

    pub fn clear_failure(&self, op: StoreOp) {
        self.lock_failures().remove(&op);
    }

    fn injected(&self, op: StoreOp) -> Result<(), StoreError> {
        match self.lock_failures().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn notify(&self, key: &JobKey) {
        // drop subscribers whose receiver is gone
        self.lock_subscribers()
            .retain(|tx| tx.send(key.clone()).is_ok());
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<JobKey>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<StoreOp, StoreError>> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get(&self, key: &JobKey) -> Result<Job, StoreError> {
        self.injected(StoreOp::Get)?;
        self.jobs
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Job>, StoreError> {
        self.injected(StoreOp::List)?;
        let jobs = self.jobs.lock().await;
        Ok(jobs
            .values()
            .filter(|j| j.namespace() == namespace)
            .cloned()
            .collect())
    }

    async fn update(&self, job: &Job) -> Result<(), StoreError> {
        self.injected(StoreOp::Update)?;
        let key = job.key();
        {
            let mut jobs = self.jobs.lock().await;
            let Some(slot) = jobs.get_mut(&key) else {
                return Err(StoreError::NotFound(key));
            };
            let uid = slot.metadata.uid;
            *slot = job.clone();
            slot.metadata.uid = uid;
        }
        self.notify(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AgentName;

    #[tokio::test]
    async fn create_assigns_uid_and_notifies() {
        let store = InMemoryJobStore::new();
        let mut rx = store.subscribe();

        let created = store.create(Job::new("default", "a")).await.unwrap();
        assert!(created.metadata.uid.is_some());
        assert_eq!(rx.recv().await, Some(JobKey::new("default", "a")));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_key() {
        let store = InMemoryJobStore::new();
        store.create(Job::new("default", "a")).await.unwrap();
        let err = store.create(Job::new("default", "a")).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict(JobKey::new("default", "a")));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = InMemoryJobStore::new();
        let err = store.get(&JobKey::new("default", "nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_is_scoped_to_namespace() {
        let store = InMemoryJobStore::new();
        store.create(Job::new("ns1", "a")).await.unwrap();
        store.create(Job::new("ns1", "b")).await.unwrap();
        store.create(Job::new("ns2", "a")).await.unwrap();

        let jobs = store.list("ns1").await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.namespace() == "ns1"));
    }

    #[tokio::test]
    async fn update_replaces_object_but_keeps_uid() {
        let store = InMemoryJobStore::new();
        let created = store.create(Job::new("default", "a")).await.unwrap();
        let mut rx = store.subscribe();

        let mut changed = Job::new("default", "a");
        changed.assign(AgentName::from("agent2"));
        store.update(&changed).await.unwrap();

        let stored = store.get(&changed.key()).await.unwrap();
        assert_eq!(stored.agent().map(AgentName::as_str), Some("agent2"));
        assert_eq!(stored.metadata.uid, created.metadata.uid);
        assert_eq!(rx.recv().await, Some(changed.key()));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemoryJobStore::new();
        let err = store.update(&Job::new("default", "ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failure_until_cleared() {
        let store = InMemoryJobStore::new();
        store.create(Job::new("default", "a")).await.unwrap();
        store.fail(StoreOp::Get, StoreError::Unavailable("down".into()));

        let key = JobKey::new("default", "a");
        assert!(matches!(
            store.get(&key).await,
            Err(StoreError::Unavailable(_))
        ));
        // other operations are unaffected
        assert_eq!(store.list("default").await.unwrap().len(), 1);

        store.clear_failure(StoreOp::Get);
        assert!(store.get(&key).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let store = InMemoryJobStore::new();
        drop(store.subscribe());
        let mut live = store.subscribe();

        store.create(Job::new("default", "a")).await.unwrap();
        assert_eq!(store.lock_subscribers().len(), 1);
        assert!(live.recv().await.is_some());
    }
}
