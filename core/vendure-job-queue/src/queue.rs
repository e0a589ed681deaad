//! A named queue and the worker task that drains it.

use crate::context::{JobContext, JobProcessor};
use crate::error::{JobQueueError, JobQueueResult};
use crate::job::{AddJobOptions, JobState, JobUpdate};
use crate::record::{JobRecord, JobStore};
use crate::updates::SubscribableJob;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vendure_types::JobId;

const SHUTDOWN_MESSAGE: &str = "job queue shut down before the job could run";

/// Arguments to [`JobQueueService::create_queue`](crate::JobQueueService::create_queue).
pub struct CreateQueueOptions<T: Send + Sync + 'static> {
    pub name: String,
    pub process: Arc<dyn JobProcessor<T>>,
}

impl<T: Send + Sync + 'static> CreateQueueOptions<T> {
    pub fn new(name: impl Into<String>, process: impl JobProcessor<T>) -> Self {
        Self {
            name: name.into(),
            process: Arc::new(process),
        }
    }
}

struct QueuedJob<T> {
    id: JobId,
    record: Arc<JobRecord>,
    data: Arc<T>,
    options: AddJobOptions,
}

/// Producer side of a queue. Jobs carry payloads of type `T`, which only the
/// queue's processor reads.
pub struct JobQueue<T> {
    name: Arc<str>,
    sender: mpsc::UnboundedSender<QueuedJob<T>>,
    jobs: Arc<JobStore>,
    defaults: AddJobOptions,
}

impl<T> Clone for JobQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            sender: self.sender.clone(),
            jobs: Arc::clone(&self.jobs),
            defaults: self.defaults,
        }
    }
}

impl<T> std::fmt::Debug for JobQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> JobQueue<T> {
    pub(crate) fn spawn(
        options: CreateQueueOptions<T>,
        jobs: Arc<JobStore>,
        defaults: AddJobOptions,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let name: Arc<str> = Arc::from(options.name);
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(
            Arc::clone(&name),
            options.process,
            receiver,
            shutdown,
        ));
        let queue = Self {
            name,
            sender,
            jobs,
            defaults,
        };
        (queue, worker)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues a job without waiting for it to run.
    pub fn add(&self, data: T, options: AddJobOptions) -> JobQueueResult<SubscribableJob> {
        options.backoff.validate()?;
        let id = JobId::new();
        let record = Arc::new(JobRecord::new(JobUpdate::pending(
            id,
            &self.name,
            options.retries,
        )));
        let job = QueuedJob {
            id,
            record: Arc::clone(&record),
            data: Arc::new(data),
            options,
        };
        self.sender
            .send(job)
            .map_err(|_| JobQueueError::QueueClosed(self.name.to_string()))?;
        self.jobs.insert(id, Arc::clone(&record));
        debug!(queue = %self.name, job = %id, retries = options.retries, "job added");
        Ok(SubscribableJob::new(id, record))
    }

    /// Enqueues a job with the service's configured retries and backoff.
    pub fn add_default(&self, data: T) -> JobQueueResult<SubscribableJob> {
        self.add(data, self.defaults)
    }
}

// ── Worker ──────────────────────────────────────────────────────

async fn run_worker<T: Send + Sync + 'static>(
    name: Arc<str>,
    process: Arc<dyn JobProcessor<T>>,
    mut receiver: mpsc::UnboundedReceiver<QueuedJob<T>>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(queue = %name, "job queue worker started");
    loop {
        if *shutdown.borrow() {
            break;
        }
        let job = tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            job = receiver.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };
        run_job(&name, process.as_ref(), job, &mut shutdown).await;
    }

    receiver.close();
    let mut abandoned = 0usize;
    while let Some(job) = receiver.recv().await {
        fail(&job.record, SHUTDOWN_MESSAGE);
        abandoned += 1;
    }
    info!(queue = %name, abandoned, "job queue worker stopped");
}

async fn run_job<T: Send + Sync + 'static>(
    name: &Arc<str>,
    process: &dyn JobProcessor<T>,
    job: QueuedJob<T>,
    shutdown: &mut watch::Receiver<bool>,
) {
    let QueuedJob {
        id,
        record,
        data,
        options,
    } = job;

    loop {
        let mut attempt = 0;
        record.update(|job| {
            job.attempts += 1;
            attempt = job.attempts;
            job.state = JobState::Running;
            job.progress = 0;
            job.started_at.get_or_insert_with(Utc::now);
        });

        let context = JobContext::new(
            id,
            Arc::clone(name),
            Arc::clone(&data),
            attempt,
            Arc::clone(&record),
        );
        let message = match AssertUnwindSafe(process.process(context)).catch_unwind().await {
            Ok(Ok(result)) => {
                record.update(|job| {
                    job.state = JobState::Completed;
                    job.result = Some(result);
                    job.error = None;
                    job.settled_at = Some(Utc::now());
                });
                debug!(queue = %name, job = %id, attempt, "job completed");
                return;
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => panic_message(panic.as_ref()),
        };

        if attempt > options.retries {
            fail(&record, &message);
            error!(queue = %name, job = %id, attempts = attempt, error = %message, "job failed");
            return;
        }

        record.update(|job| {
            job.state = JobState::Retrying;
            job.error = Some(message.clone());
        });
        let delay = options.backoff.delay(attempt);
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        warn!(
            queue = %name,
            job = %id,
            attempt,
            retries = options.retries,
            delay_ms,
            error = %message,
            "job attempt failed, retrying"
        );

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if *shutdown.borrow() {
            fail(&record, SHUTDOWN_MESSAGE);
            return;
        }
    }
}

fn fail(record: &JobRecord, message: &str) {
    record.update(|job| {
        job.state = JobState::Failed;
        job.error = Some(message.to_string());
        job.settled_at = Some(Utc::now());
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    format!("processor panicked: {detail}")
}
