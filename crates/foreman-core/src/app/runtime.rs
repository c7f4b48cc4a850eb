//! ForemanRuntime - handle over the spawned workers and dispatcher.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::builder::RuntimeBuilder;
use super::controller::ReconcileController;
use super::queue::AgentQueue;
use super::status::AgentStatus;
use crate::config::ForemanConfig;
use crate::domain::{ConfigError, JobKey};
use crate::ports::{EventSink, JobStore};

/// Running controller.
/// - `request_shutdown()` stops workers at their next suspension point
/// - `shutdown_and_join()` also waits for every task to finish
pub struct ForemanRuntime {
    controller: Arc<ReconcileController>,
    queues: Vec<Arc<AgentQueue>>,
    cancel: CancellationToken,
    joins: Vec<JoinHandle<()>>,
}

impl ForemanRuntime {
    /// Start with config-driven placement and execution.
    pub fn start(
        config: ForemanConfig,
        store: Arc<dyn JobStore>,
        notifications: mpsc::UnboundedReceiver<JobKey>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        RuntimeBuilder::new(config)
            .events(events)
            .start(store, notifications)
    }

    pub(crate) fn new(
        controller: Arc<ReconcileController>,
        queues: Vec<Arc<AgentQueue>>,
        cancel: CancellationToken,
        joins: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            controller,
            queues,
            cancel,
            joins,
        }
    }

    /// Reconcile entry point, for callers that deliver keys themselves.
    pub fn controller(&self) -> &Arc<ReconcileController> {
        &self.controller
    }

    /// Queue counts per agent, in pool order.
    pub async fn statuses(&self) -> Vec<AgentStatus> {
        let mut out = Vec::with_capacity(self.queues.len());
        for queue in &self.queues {
            out.push(queue.status().await);
        }
        out
    }

    /// Every agent queue is empty.
    pub async fn is_idle(&self) -> bool {
        for queue in &self.queues {
            if !queue.is_empty().await {
                return false;
            }
        }
        true
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn request_shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(err) = join.await {
                tracing::error!(error = %err, "runtime task panicked");
            }
        }
        tracing::info!("foreman runtime stopped");
    }
}
