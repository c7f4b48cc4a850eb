//! App - the controller itself, built from the ports.
//!
//! # Components
//! - **ReconcileController**: fetches a notified job and schedules it once
//! - **Scheduler**: places a job on one agent's queue
//! - **AgentWorker**: advances one agent's queue every cycle
//! - **DependencyResolver**: checks `dependsOn` against the store
//! - **Dispatcher**: notification loop with requeue on transient errors
//! - **RuntimeBuilder / ForemanRuntime**: wiring and lifecycle

pub mod agent;
pub mod builder;
pub mod controller;
pub mod dispatcher;
pub mod queue;
pub mod resolver;
pub mod retry;
pub mod runtime;
pub mod scheduler;
pub mod status;

pub use self::agent::{AgentWorker, CycleReport};
pub use self::builder::RuntimeBuilder;
pub use self::controller::{ReconcileController, ReconcileOutcome};
pub use self::dispatcher::Dispatcher;
pub use self::queue::AgentQueue;
pub use self::resolver::{Blocker, DependencyResolver, MissingDependencyPolicy, Readiness};
pub use self::retry::{RequeuePolicy, RetryPolicy};
pub use self::runtime::ForemanRuntime;
pub use self::scheduler::Scheduler;
pub use self::status::AgentStatus;
