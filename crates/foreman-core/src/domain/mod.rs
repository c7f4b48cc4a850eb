//! Domain model (ids, job record, state machine, events, errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod job;
pub mod state;

pub use errors::{ConfigError, InvalidTransition, ReconcileError, StoreError};
pub use events::{JobEvent, Reason, Severity};
pub use ids::{AgentName, JobKey, JobUid};
pub use job::{Job, JobMeta, JobSpec, JobStatus};
pub use state::JobState;
