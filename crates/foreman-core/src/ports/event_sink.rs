//! EventSink port - observability events about jobs.

use crate::domain::JobEvent;

/// Records human-readable events against jobs.
///
/// Fire-and-forget: implementations swallow their own failures so that
/// recording an event can never change how a job is processed.
pub trait EventSink: Send + Sync {
    fn record(&self, event: JobEvent);
}
