//! Ports - seams between the core and its collaborators.
//!
//! The store, event recording, agent placement and job execution are all
//! reached through these traits so tests and the CLI can plug in their own.

pub mod event_sink;
pub mod executor;
pub mod job_store;
pub mod placement;

pub use self::event_sink::EventSink;
pub use self::executor::Executor;
pub use self::job_store::JobStore;
pub use self::placement::PlacementPolicy;
