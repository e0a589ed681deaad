//! Error types for the job queue.

use std::time::Duration;
use thiserror::Error;
use vendure_types::JobId;

/// Result type for job queue operations.
pub type JobQueueResult<T> = Result<T, JobQueueError>;

/// Errors surfaced by queues, job handles and update streams.
#[derive(Debug, Error)]
pub enum JobQueueError {
    /// A queue with this name already exists in the service.
    #[error("job queue '{0}' is already registered")]
    DuplicateQueue(String),

    #[error("job queue '{0}' is not registered")]
    UnknownQueue(String),

    /// The queue's worker has stopped; no new jobs are accepted.
    #[error("job queue '{0}' is closed")]
    QueueClosed(String),

    /// Terminal failure delivered on a job's update stream after the retry
    /// budget is exhausted.
    #[error("job {id} on queue '{queue_name}' failed after {attempts} attempt(s): {message}")]
    JobFailed {
        id: JobId,
        queue_name: String,
        attempts: u32,
        message: String,
    },

    #[error("job {id} did not settle within {timeout:?}")]
    UpdatesTimeout { id: JobId, timeout: Duration },

    #[error("invalid job queue options: {0}")]
    InvalidOptions(String),
}
