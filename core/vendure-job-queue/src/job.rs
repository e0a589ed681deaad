//! Job states, snapshots and per-job options.

use crate::backoff::BackoffStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use vendure_types::JobId;

/// Lifecycle of a job:
/// `Pending -> Running -> {Completed | Retrying -> Running | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Retrying,
    Completed,
    Failed,
}

impl JobState {
    /// Whether the job has reached a terminal state.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Retrying => "RETRYING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        })
    }
}

/// A point-in-time view of a job, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub id: JobId,
    pub queue_name: String,
    pub state: JobState,
    /// Percent complete, 0 to 100.
    pub progress: u8,
    /// The processor's return value once `Completed`.
    pub result: Option<Value>,
    /// Message of the most recent failed attempt.
    pub error: Option<String>,
    /// Attempts started so far.
    pub attempts: u32,
    /// Retry budget: the job runs at most `retries + 1` times.
    pub retries: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub(crate) fn pending(id: JobId, queue_name: &str, retries: u32) -> Self {
        Self {
            id,
            queue_name: queue_name.to_string(),
            state: JobState::Pending,
            progress: 0,
            result: None,
            error: None,
            attempts: 0,
            retries,
            created_at: Utc::now(),
            started_at: None,
            settled_at: None,
        }
    }
}

/// Options for [`JobQueue::add`](crate::JobQueue::add).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddJobOptions {
    /// Extra attempts after the first failure.
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub backoff: BackoffStrategy,
}

impl AddJobOptions {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Options for [`SubscribableJob::updates`](crate::SubscribableJob::updates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatesOptions {
    /// End the stream with `UpdatesTimeout` if the job has not settled
    /// this long after subscribing.
    pub timeout: Option<Duration>,
    /// Deliver a final `Failed` snapshot as an error (the default) rather
    /// than as an ordinary update.
    pub error_on_fail: bool,
}

impl Default for UpdatesOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            error_on_fail: true,
        }
    }
}

impl UpdatesOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn error_on_fail(mut self, error_on_fail: bool) -> Self {
        self.error_on_fail = error_on_fail;
        self
    }
}
