//! Job state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a job.
///
/// State transitions:
/// - Unset -> Pending (first observation by the owning agent)
/// - Pending -> Succeeded (dependencies met, even result)
/// - Pending -> Failed (dependencies met, odd result)
/// - Failed -> Succeeded | Failed (re-execution under the retry policy)
///
/// `Succeeded` is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobState {
    /// Not yet observed by its agent.
    #[default]
    Unset,

    /// Accepted by an agent, waiting for dependencies or execution.
    Pending,

    /// Executed with an even result code.
    Succeeded,

    /// Executed with an odd result code.
    Failed,
}

impl JobState {
    /// Is this a terminal state?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    /// Position in the `Unset < Pending < {Succeeded, Failed}` order.
    pub fn rank(self) -> u8 {
        match self {
            JobState::Unset => 0,
            JobState::Pending => 1,
            JobState::Succeeded | JobState::Failed => 2,
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: JobState) -> bool {
        match (self, next) {
            (JobState::Unset, JobState::Pending) => true,
            (JobState::Pending, JobState::Succeeded | JobState::Failed) => true,
            (JobState::Failed, JobState::Succeeded | JobState::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Unset => "Unset",
            JobState::Pending => "Pending",
            JobState::Succeeded => "Succeeded",
            JobState::Failed => "Failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::accept(JobState::Unset, JobState::Pending)]
    #[case::succeed(JobState::Pending, JobState::Succeeded)]
    #[case::fail(JobState::Pending, JobState::Failed)]
    #[case::retry_succeeds(JobState::Failed, JobState::Succeeded)]
    #[case::retry_fails(JobState::Failed, JobState::Failed)]
    fn legal_transitions(#[case] from: JobState, #[case] to: JobState) {
        assert!(from.can_transition_to(to));
        assert!(from.rank() <= to.rank());
    }

    #[rstest]
    #[case::skip_pending(JobState::Unset, JobState::Succeeded)]
    #[case::revert_to_unset(JobState::Pending, JobState::Unset)]
    #[case::leave_succeeded(JobState::Succeeded, JobState::Failed)]
    #[case::re_pend_succeeded(JobState::Succeeded, JobState::Pending)]
    #[case::re_pend_failed(JobState::Failed, JobState::Pending)]
    fn illegal_transitions(#[case] from: JobState, #[case] to: JobState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn default_is_unset() {
        assert_eq!(JobState::default(), JobState::Unset);
        assert!(!JobState::Pending.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }
}
