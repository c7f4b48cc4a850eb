//! Executor port - runs a job and produces its result code.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::Job;

/// Executes a ready job.
///
/// Execution never fails: it yields a result code whose parity decides the
/// outcome. `None` means the run was interrupted by `cancel` and no result
/// must be recorded.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, job: &Job, cancel: &CancellationToken) -> Option<i32>;
}
