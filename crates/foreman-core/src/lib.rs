//! foreman-core
//!
//! Assigns jobs from a watchable store to a fixed pool of agents, gates them
//! on their dependencies and drives each one to a terminal state.
//!
//! # Modules
//! - **domain**: job record, state machine, events, errors
//! - **ports**: store, event sink, placement and executor traits
//! - **impls**: in-memory store, timeout decorator, sinks, random placement, executors
//! - **app**: controller, scheduler, agent workers, resolver, runtime
//! - **config**: TOML configuration

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{ForemanRuntime, RuntimeBuilder};
pub use config::ForemanConfig;
