//! RuntimeBuilder - wiring for a [`ForemanRuntime`].
//!
//! Configuration is validated before anything is spawned. Placement,
//! execution and event recording default to the config-driven
//! implementations and can be replaced for tests.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::agent::AgentWorker;
use super::controller::ReconcileController;
use super::dispatcher::Dispatcher;
use super::queue::AgentQueue;
use super::runtime::ForemanRuntime;
use super::scheduler::Scheduler;
use crate::config::ForemanConfig;
use crate::domain::{ConfigError, JobKey};
use crate::impls::{RandomPlacement, SimulatedExecutor, TimedStore, TracingEventSink};
use crate::ports::{EventSink, Executor, JobStore, PlacementPolicy};

/// # Example
/// ```ignore
/// let runtime = RuntimeBuilder::new(config)
///     .executor(Arc::new(ScriptedExecutor::always(42)))
///     .start(store, notifications)?;
/// ```
pub struct RuntimeBuilder {
    config: ForemanConfig,
    placement: Option<Arc<dyn PlacementPolicy>>,
    executor: Option<Arc<dyn Executor>>,
    events: Option<Arc<dyn EventSink>>,
}

impl RuntimeBuilder {
    pub fn new(config: ForemanConfig) -> Self {
        Self {
            config,
            placement: None,
            executor: None,
            events: None,
        }
    }

    pub fn placement(mut self, placement: Arc<dyn PlacementPolicy>) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Spawn one worker per agent plus the dispatcher. Must be called inside
    /// a tokio runtime.
    ///
    /// Every store call made by the runtime is bounded by
    /// `store_timeout_ms`.
    pub fn start(
        self,
        store: Arc<dyn JobStore>,
        notifications: mpsc::UnboundedReceiver<JobKey>,
    ) -> Result<ForemanRuntime, ConfigError> {
        let config = self.config;
        config.validate()?;

        let seed = config.seed;
        let placement: Arc<dyn PlacementPolicy> = match self.placement {
            Some(placement) => placement,
            None => match seed {
                Some(seed) => Arc::new(RandomPlacement::seeded(seed)),
                None => Arc::new(RandomPlacement::new()),
            },
        };
        let executor: Arc<dyn Executor> = match self.executor {
            Some(executor) => executor,
            None => {
                let delay = config.execution.delay_range();
                let bound = config.execution.result_bound;
                match seed {
                    // distinct stream from placement
                    Some(seed) => Arc::new(SimulatedExecutor::seeded(seed.wrapping_add(1), delay, bound)),
                    None => Arc::new(SimulatedExecutor::from_entropy(delay, bound)),
                }
            }
        };
        let events: Arc<dyn EventSink> = match self.events {
            Some(events) => events,
            None => Arc::new(TracingEventSink),
        };
        let store: Arc<dyn JobStore> = Arc::new(TimedStore::new(store, config.store_timeout()));

        let queues: Vec<Arc<AgentQueue>> = config
            .agent_names()
            .into_iter()
            .map(|agent| Arc::new(AgentQueue::new(agent)))
            .collect();
        let scheduler = Arc::new(Scheduler::new(queues.clone(), placement, events.clone()));
        let controller = Arc::new(ReconcileController::new(store.clone(), scheduler));

        let cancel = CancellationToken::new();
        let mut joins = Vec::with_capacity(queues.len() + 1);
        for queue in &queues {
            let worker = AgentWorker::new(queue.clone(), store.clone(), events.clone(), executor.clone())
                .with_retry(config.retry)
                .with_missing_dependency(config.missing_dependency)
                .with_poll_interval(config.poll_interval());
            joins.push(tokio::spawn(worker.run(cancel.child_token())));
        }

        let dispatcher = Dispatcher::new(controller.clone(), config.requeue.clone(), notifications);
        joins.push(tokio::spawn(dispatcher.run(cancel.child_token())));

        tracing::info!(
            agents = queues.len(),
            seed = ?seed,
            retry = ?config.retry,
            missing_dependency = ?config.missing_dependency,
            "foreman runtime started"
        );
        Ok(ForemanRuntime::new(controller, queues, cancel, joins))
    }
}
