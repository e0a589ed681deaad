//! Job handles and their update streams.

use crate::error::{JobQueueError, JobQueueResult};
use crate::job::{JobState, JobUpdate, UpdatesOptions};
use crate::record::JobRecord;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use vendure_types::JobId;

/// Handle to a submitted job. Cheap to clone; every clone observes the same
/// job.
#[derive(Clone)]
pub struct SubscribableJob {
    id: JobId,
    record: Arc<JobRecord>,
}

impl SubscribableJob {
    pub(crate) fn new(id: JobId, record: Arc<JobRecord>) -> Self {
        Self { id, record }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// The job as it is right now.
    pub fn snapshot(&self) -> JobUpdate {
        self.record.snapshot()
    }

    /// Streams the current snapshot, then every later change, ending after
    /// the job settles. History before the call is not replayed. Changes are
    /// buffered per stream, so a slow reader misses no state transition.
    ///
    /// A final `Failed` snapshot arrives as [`JobQueueError::JobFailed`]
    /// unless `options.error_on_fail` is off.
    pub fn updates(&self, options: UpdatesOptions) -> BoxStream<'static, JobQueueResult<JobUpdate>> {
        let (current, rx) = self.record.subscribe();
        let subscription = Subscription {
            id: self.id,
            next: Some(current),
            rx,
            record: Arc::clone(&self.record),
            deadline: options.timeout.map(|timeout| (Instant::now() + timeout, timeout)),
            error_on_fail: options.error_on_fail,
            done: false,
        };

        stream::unfold(subscription, |mut sub| async move {
            if sub.done {
                return None;
            }
            let update = match sub.next.take() {
                Some(update) => update,
                None => match sub.recv().await {
                    Ok(update) => update,
                    Err(e) => {
                        sub.done = true;
                        return Some((Err(e), sub));
                    }
                },
            };
            let item = sub.deliver(update);
            Some((item, sub))
        })
        .boxed()
    }

    /// Waits for the job to settle and returns its result, or the failure.
    pub async fn result(&self) -> JobQueueResult<Value> {
        let mut updates = self.updates(UpdatesOptions::default());
        let mut last = None;
        while let Some(update) = updates.next().await {
            last = Some(update?);
        }
        Ok(last.and_then(|job| job.result).unwrap_or(Value::Null))
    }
}

impl std::fmt::Debug for SubscribableJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscribableJob").field("id", &self.id).finish()
    }
}

struct Subscription {
    id: JobId,
    next: Option<JobUpdate>,
    rx: mpsc::UnboundedReceiver<JobUpdate>,
    record: Arc<JobRecord>,
    deadline: Option<(Instant, Duration)>,
    error_on_fail: bool,
    done: bool,
}

impl Subscription {
    async fn recv(&mut self) -> JobQueueResult<JobUpdate> {
        let received = match self.deadline {
            Some((deadline, timeout)) => tokio::time::timeout_at(deadline, self.rx.recv())
                .await
                .map_err(|_| JobQueueError::UpdatesTimeout { id: self.id, timeout })?,
            None => self.rx.recv().await,
        };
        // The channel closes right after the settling update is queued, so
        // `None` only follows a snapshot that already ended the stream.
        Ok(received.unwrap_or_else(|| self.record.snapshot()))
    }

    fn deliver(&mut self, update: JobUpdate) -> JobQueueResult<JobUpdate> {
        if !update.state.is_settled() {
            return Ok(update);
        }
        self.done = true;
        if update.state == JobState::Failed && self.error_on_fail {
            return Err(JobQueueError::JobFailed {
                id: update.id,
                queue_name: update.queue_name,
                attempts: update.attempts,
                message: update.error.unwrap_or_default(),
            });
        }
        Ok(update)
    }
}
