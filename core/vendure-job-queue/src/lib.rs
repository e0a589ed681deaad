//! In-process background job queues.
//!
//! A [`JobQueueService`] owns named [`JobQueue`]s, each drained by one tokio
//! worker that runs its processor on one job at a time, in submission order.
//! Every job moves through
//! `Pending -> Running -> {Completed | Retrying -> Running | Failed}`:
//! a processor error or panic consumes one retry, and only exhausting the
//! budget fails the job.
//!
//! [`JobQueue::add`] returns a [`SubscribableJob`] whose
//! [`updates`](SubscribableJob::updates) stream yields the current snapshot
//! followed by every later change, and ends once the job settles. Any number
//! of subscribers may watch the same job.
//!
//! ```no_run
//! use serde_json::json;
//! use vendure_job_queue::{AddJobOptions, CreateQueueOptions, JobContext, JobQueueService};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let service = JobQueueService::default();
//! let queue = service.create_queue(CreateQueueOptions::new(
//!     "reindex",
//!     |job: JobContext<Vec<u32>>| async move {
//!         job.set_progress(100);
//!         anyhow::Ok(json!({ "indexed": job.data().len() }))
//!     },
//! ))?;
//! let job = queue.add(vec![1, 2, 3], AddJobOptions::with_retries(2))?;
//! println!("{}", job.result().await?);
//! # Ok(())
//! # }
//! ```

mod backoff;
mod config;
mod context;
mod error;
mod job;
mod queue;
mod record;
mod service;
mod updates;

pub use backoff::BackoffStrategy;
pub use config::JobQueueConfig;
pub use context::{JobContext, JobProcessor};
pub use error::{JobQueueError, JobQueueResult};
pub use job::{AddJobOptions, JobState, JobUpdate, UpdatesOptions};
pub use queue::{CreateQueueOptions, JobQueue};
pub use service::{JobQueueInfo, JobQueueService};
pub use updates::SubscribableJob;
pub use vendure_types::JobId;
