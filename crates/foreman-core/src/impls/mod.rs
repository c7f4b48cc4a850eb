//! Impls - development and test implementations of the ports.
//!
//! # Included
//! - **InMemoryJobStore**: job store with change notifications and failure injection
//! - **TimedStore**: per-call timeout decorator for any store
//! - **TracingEventSink / RecordingEventSink**: event recording
//! - **RandomPlacement**: baseline uniform-random agent choice
//! - **SimulatedExecutor / ScriptedExecutor**: result producers

pub mod event_sinks;
pub mod executor;
pub mod inmem_store;
pub mod placement;
pub mod timed_store;

pub use self::event_sinks::{RecordingEventSink, TracingEventSink};
pub use self::executor::{ScriptedExecutor, SimulatedExecutor};
pub use self::inmem_store::{InMemoryJobStore, StoreOp};
pub use self::placement::RandomPlacement;
pub use self::timed_store::TimedStore;
