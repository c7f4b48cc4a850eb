//! Human-readable events recorded against jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::JobKey;
use super::job::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Warning,
}

/// Short machine-friendly cause of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// Job was scheduled, or is waiting on a dependency.
    Pending,
    Succeeded,
    Failed,
    BackoffLimitExceeded,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reason::Pending => "Pending",
            Reason::Succeeded => "Succeeded",
            Reason::Failed => "Failed",
            Reason::BackoffLimitExceeded => "BackoffLimitExceeded",
        };
        f.write_str(s)
    }
}

/// One event about one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job: JobKey,
    pub severity: Severity,
    pub reason: Reason,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(job: &Job, severity: Severity, reason: Reason, message: impl Into<String>) -> Self {
        Self {
            job: job.key(),
            severity,
            reason,
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn normal(job: &Job, reason: Reason, message: impl Into<String>) -> Self {
        Self::new(job, Severity::Normal, reason, message)
    }

    pub fn warning(job: &Job, reason: Reason, message: impl Into<String>) -> Self {
        Self::new(job, Severity::Warning, reason, message)
    }
}
