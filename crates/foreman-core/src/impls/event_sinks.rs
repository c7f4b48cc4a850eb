//! Event sinks: one that logs, one that remembers.

use std::sync::Mutex;

use crate::domain::{JobEvent, JobKey, Reason, Severity};
use crate::ports::EventSink;

/// Writes every event to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: JobEvent) {
        match event.severity {
            Severity::Normal => tracing::info!(
                job = %event.job,
                reason = %event.reason,
                "{}",
                event.message
            ),
            Severity::Warning => tracing::warn!(
                job = %event.job,
                reason = %event.reason,
                "{}",
                event.message
            ),
        }
    }
}

/// Keeps events in memory, in recording order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<JobEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<JobEvent> {
        self.lock().clone()
    }

    pub fn events_for(&self, job: &JobKey) -> Vec<JobEvent> {
        self.lock()
            .iter()
            .filter(|e| &e.job == job)
            .cloned()
            .collect()
    }

    pub fn count(&self, job: &JobKey, reason: Reason) -> usize {
        self.lock()
            .iter()
            .filter(|e| &e.job == job && e.reason == reason)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<JobEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for RecordingEventSink {
    fn record(&self, event: JobEvent) {
        self.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Job;

    #[test]
    fn recording_sink_filters_by_job_and_reason() {
        let sink = RecordingEventSink::new();
        let a = Job::new("default", "a");
        let b = Job::new("default", "b");

        sink.record(JobEvent::normal(&a, Reason::Pending, "Job Pending"));
        sink.record(JobEvent::warning(&a, Reason::Failed, "Job Failed, result:3"));
        sink.record(JobEvent::normal(&b, Reason::Pending, "Job Pending"));

        assert_eq!(sink.events().len(), 3);
        assert_eq!(sink.events_for(&a.key()).len(), 2);
        assert_eq!(sink.count(&a.key(), Reason::Failed), 1);
        assert_eq!(sink.count(&b.key(), Reason::Failed), 0);
    }

    #[test]
    fn tracing_sink_accepts_events_without_subscriber() {
        let job = Job::new("default", "a");
        TracingEventSink.record(JobEvent::warning(&job, Reason::Pending, "blocked"));
    }
}
