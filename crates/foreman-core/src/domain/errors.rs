//! Error types shared across the crate.

use std::time::Duration;

use thiserror::Error;

use super::ids::JobKey;
use super::state::JobState;

/// Errors returned by a [`JobStore`](crate::ports::JobStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(JobKey),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("conflicting write for job {0}")]
    Conflict(JobKey),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Reconcile failed and the key should be delivered again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("failed to fetch job {key}: {source}")]
    Fetch {
        key: JobKey,
        #[source]
        source: StoreError,
    },

    #[error("no agent available for job {0}")]
    NoAgent(JobKey),
}

impl ReconcileError {
    pub fn key(&self) -> &JobKey {
        match self {
            ReconcileError::Fetch { key, .. } => key,
            ReconcileError::NoAgent(key) => key,
        }
    }

    /// Fetch failures are requeued. A placement that finds no agent will not
    /// find one on redelivery either.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::Fetch { .. })
    }
}

/// A state change the job state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {key}: illegal transition {from} -> {to}")]
pub struct InvalidTransition {
    pub key: JobKey,
    pub from: JobState,
    pub to: JobState,
}

/// Errors while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
