//! What a processor sees while running a job.

use crate::job::JobState;
use crate::record::JobRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use vendure_types::JobId;

/// Handle passed to the processor for one attempt of one job.
pub struct JobContext<T> {
    id: JobId,
    queue_name: Arc<str>,
    data: Arc<T>,
    attempt: u32,
    record: Arc<JobRecord>,
}

impl<T> JobContext<T> {
    pub(crate) fn new(
        id: JobId,
        queue_name: Arc<str>,
        data: Arc<T>,
        attempt: u32,
        record: Arc<JobRecord>,
    ) -> Self {
        Self {
            id,
            queue_name,
            data,
            attempt,
            record,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// The payload passed to [`JobQueue::add`](crate::JobQueue::add).
    pub fn data(&self) -> &T {
        &self.data
    }

    /// 1-based number of the current attempt.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Reports progress in percent, clamped to 0..=100. Only subscribers
    /// observe it; scheduling is unaffected. Ignored once the attempt is over.
    pub fn set_progress(&self, percent: i32) {
        let progress = percent.clamp(0, 100) as u8;
        let attempt = self.attempt;
        self.record.update_if(|job| {
            if job.state != JobState::Running || job.attempts != attempt || job.progress == progress {
                return false;
            }
            job.progress = progress;
            true
        });
    }
}

impl<T> Clone for JobContext<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            queue_name: Arc::clone(&self.queue_name),
            data: Arc::clone(&self.data),
            attempt: self.attempt,
            record: Arc::clone(&self.record),
        }
    }
}

impl<T> std::fmt::Debug for JobContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("id", &self.id)
            .field("queue_name", &self.queue_name)
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

/// Runs jobs for one queue. Implemented for any
/// `Fn(JobContext<T>) -> impl Future<Output = anyhow::Result<Value>>`.
#[async_trait]
pub trait JobProcessor<T: Send + Sync + 'static>: Send + Sync + 'static {
    async fn process(&self, job: JobContext<T>) -> anyhow::Result<Value>;
}

#[async_trait]
impl<T, F, Fut> JobProcessor<T> for F
where
    T: Send + Sync + 'static,
    F: Fn(JobContext<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn process(&self, job: JobContext<T>) -> anyhow::Result<Value> {
        (self)(job).await
    }
}
