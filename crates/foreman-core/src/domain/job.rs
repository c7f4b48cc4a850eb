//! Job record: metadata, desired spec and observed status.

use serde::{Deserialize, Serialize};

use super::errors::InvalidTransition;
use super::ids::{AgentName, JobKey, JobUid};
use super::state::JobState;

/// Object metadata owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMeta {
    pub namespace: String,
    pub name: String,

    /// Assigned by the store on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<JobUid>,
}

/// Desired state of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Agent responsible for this job. `None` means unscheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentName>,

    /// Maximum number of retries. Only consulted by `RetryPolicy::BackoffLimit`.
    #[serde(default)]
    pub backoff_limit: u32,

    /// Names of jobs in the same namespace that must succeed first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Outcome code of the last execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i32>,
}

/// Observed state of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub state: JobState,

    #[serde(default)]
    pub succeeded: u32,

    #[serde(default)]
    pub failed: u32,
}

/// A unit of dependency-gated work.
///
/// State changes go through methods so the state machine in [`JobState`]
/// is enforced in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub metadata: JobMeta,

    #[serde(default)]
    pub spec: JobSpec,

    #[serde(default)]
    pub status: JobStatus,
}

impl Job {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: JobMeta {
                namespace: namespace.into(),
                name: name.into(),
                uid: None,
            },
            spec: JobSpec::default(),
            status: JobStatus::default(),
        }
    }

    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_backoff_limit(mut self, limit: u32) -> Self {
        self.spec.backoff_limit = limit;
        self
    }

    pub fn key(&self) -> JobKey {
        JobKey::new(&self.metadata.namespace, &self.metadata.name)
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn state(&self) -> JobState {
        self.status.state
    }

    pub fn agent(&self) -> Option<&AgentName> {
        self.spec.agent.as_ref()
    }

    /// An empty agent name counts as unscheduled.
    pub fn is_assigned(&self) -> bool {
        self.spec
            .agent
            .as_ref()
            .is_some_and(|a| !a.as_str().is_empty())
    }

    /// Set the agent if none is set yet. Returns false when already assigned.
    pub fn assign(&mut self, agent: AgentName) -> bool {
        if self.is_assigned() {
            return false;
        }
        self.spec.agent = Some(agent);
        true
    }

    /// Unset -> Pending.
    pub fn mark_pending(&mut self) -> Result<(), InvalidTransition> {
        self.transition(JobState::Pending)
    }

    /// Apply an execution result: even succeeds, odd fails.
    ///
    /// Bumps the matching counter and returns the new state.
    pub fn record_result(&mut self, result: i32) -> Result<JobState, InvalidTransition> {
        let next = if result % 2 == 0 {
            JobState::Succeeded
        } else {
            JobState::Failed
        };
        self.transition(next)?;
        self.spec.result = Some(result);
        match next {
            JobState::Succeeded => self.status.succeeded += 1,
            _ => self.status.failed += 1,
        }
        Ok(next)
    }

    /// More failures recorded than `backoff_limit` allows retries for.
    pub fn backoff_exhausted(&self) -> bool {
        self.status.failed > self.spec.backoff_limit
    }

    fn transition(&mut self, next: JobState) -> Result<(), InvalidTransition> {
        let from = self.status.state;
        if !from.can_transition_to(next) {
            return Err(InvalidTransition {
                key: self.key(),
                from,
                to: next,
            });
        }
        self.status.state = next;
        Ok(())
    }
}
