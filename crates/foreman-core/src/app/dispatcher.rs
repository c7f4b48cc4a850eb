//! Dispatcher - feeds change notifications into the controller.
//!
//! Keys are reconciled one at a time in arrival order. A key whose reconcile
//! fails with a retryable error is delivered again after the requeue delay;
//! its attempt count resets once a reconcile of that key succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::controller::ReconcileController;
use super::retry::RequeuePolicy;
use crate::domain::JobKey;

pub struct Dispatcher {
    controller: Arc<ReconcileController>,
    requeue: RequeuePolicy,
    notifications: mpsc::UnboundedReceiver<JobKey>,
    retry_tx: mpsc::UnboundedSender<JobKey>,
    retry_rx: mpsc::UnboundedReceiver<JobKey>,
    attempts: HashMap<JobKey, u32>,
}

impl Dispatcher {
    pub fn new(
        controller: Arc<ReconcileController>,
        requeue: RequeuePolicy,
        notifications: mpsc::UnboundedReceiver<JobKey>,
    ) -> Self {
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            requeue,
            notifications,
            retry_tx,
            retry_rx,
            attempts: HashMap::new(),
        }
    }

    /// Run until `cancel` fires or the notification stream closes.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("dispatcher started");
        loop {
            let key = tokio::select! {
                _ = cancel.cancelled() => break,
                key = self.notifications.recv() => match key {
                    Some(key) => key,
                    None => {
                        tracing::info!("notification stream closed");
                        break;
                    }
                },
                Some(key) = self.retry_rx.recv() => key,
            };
            self.dispatch(key, &cancel).await;
        }
        tracing::info!("dispatcher stopped");
    }

    async fn dispatch(&mut self, key: JobKey, cancel: &CancellationToken) {
        match self.controller.reconcile(&key).await {
            Ok(outcome) => {
                tracing::debug!(job = %key, ?outcome, "reconciled");
                self.attempts.remove(&key);
            }
            Err(err) if err.is_retryable() => {
                let attempt = self.attempts.entry(key.clone()).or_insert(0);
                *attempt += 1;
                let delay = self.requeue.next_delay(*attempt);
                tracing::warn!(job = %key, error = %err, attempt = *attempt, ?delay, "requeueing job");
                self.schedule_retry(key, delay, cancel.clone());
            }
            Err(err) => {
                tracing::error!(job = %key, error = %err, "reconcile failed, not requeueing");
                self.attempts.remove(&key);
            }
        }
    }

    fn schedule_retry(&self, key: JobKey, delay: std::time::Duration, cancel: CancellationToken) {
        let tx = self.retry_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // the dispatcher may be gone already
                    let _ = tx.send(key);
                }
            }
        });
    }
}
