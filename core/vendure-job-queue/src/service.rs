//! Process-level registry of named queues.

use crate::config::JobQueueConfig;
use crate::error::{JobQueueError, JobQueueResult};
use crate::job::JobUpdate;
use crate::queue::{CreateQueueOptions, JobQueue};
use crate::record::JobStore;
use crate::updates::SubscribableJob;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vendure_types::JobId;

/// A registered queue as reported by [`JobQueueService::queue_list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQueueInfo {
    pub name: String,
    /// Whether the queue's worker is still accepting jobs.
    pub running: bool,
}

struct QueueEntry {
    worker: Option<JoinHandle<()>>,
}

impl QueueEntry {
    fn running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }
}

/// Owns every queue of the process and the records of every job they accept.
///
/// Queue names are unique within one service. Dropping the service stops its
/// workers; [`shutdown`](Self::shutdown) does the same and waits for them.
pub struct JobQueueService {
    config: JobQueueConfig,
    jobs: Arc<JobStore>,
    queues: Mutex<BTreeMap<String, QueueEntry>>,
    shutdown: watch::Sender<bool>,
}

impl Default for JobQueueService {
    fn default() -> Self {
        Self::new(JobQueueConfig::default())
    }
}

impl JobQueueService {
    pub fn new(config: JobQueueConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            jobs: Arc::new(JobStore::default()),
            queues: Mutex::new(BTreeMap::new()),
            shutdown,
        }
    }

    pub fn config(&self) -> &JobQueueConfig {
        &self.config
    }

    fn queues(&self) -> MutexGuard<'_, BTreeMap<String, QueueEntry>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a queue and spawns its worker on the current tokio runtime.
    pub fn create_queue<T: Send + Sync + 'static>(
        &self,
        options: CreateQueueOptions<T>,
    ) -> JobQueueResult<JobQueue<T>> {
        if *self.shutdown.borrow() {
            return Err(JobQueueError::QueueClosed(options.name));
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(JobQueueError::InvalidOptions(format!(
                "job queue '{}' must be created inside a tokio runtime",
                options.name
            )));
        }

        let mut queues = self.queues();
        if queues.contains_key(&options.name) {
            return Err(JobQueueError::DuplicateQueue(options.name));
        }
        let name = options.name.clone();
        let (queue, worker) = JobQueue::spawn(
            options,
            Arc::clone(&self.jobs),
            self.config.job_options(),
            self.shutdown.subscribe(),
        );
        queues.insert(name.clone(), QueueEntry { worker: Some(worker) });
        info!(queue = %name, "job queue created");
        Ok(queue)
    }

    pub fn job(&self, id: JobId) -> Option<SubscribableJob> {
        self.jobs.get(&id).map(|record| SubscribableJob::new(id, record))
    }

    /// Snapshots of every retained job on a queue, in submission order.
    pub fn jobs(&self, queue_name: &str) -> JobQueueResult<Vec<JobUpdate>> {
        if !self.queues().contains_key(queue_name) {
            return Err(JobQueueError::UnknownQueue(queue_name.to_string()));
        }
        Ok(self.jobs.on_queue(queue_name))
    }

    /// Registered queues sorted by name.
    pub fn queue_list(&self) -> Vec<JobQueueInfo> {
        self.queues()
            .iter()
            .map(|(name, entry)| JobQueueInfo {
                name: name.clone(),
                running: entry.running(),
            })
            .collect()
    }

    /// Forgets jobs that settled more than `older_than` ago. Handles already
    /// given out keep working.
    pub fn remove_settled_jobs(&self, older_than: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };
        self.jobs.remove_settled_before(cutoff)
    }

    /// Stops every worker once its in-flight attempt finishes and waits for
    /// them. Jobs still queued, or waiting to retry, end as `Failed`.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let workers: Vec<(String, JoinHandle<()>)> = self
            .queues()
            .iter_mut()
            .filter_map(|(name, entry)| entry.worker.take().map(|worker| (name.clone(), worker)))
            .collect();

        info!(queues = workers.len(), "shutting down job queues");
        for (name, worker) in workers {
            if let Err(e) = worker.await {
                warn!(queue = %name, "job queue worker ended abnormally: {e}");
            }
        }
    }
}

impl std::fmt::Debug for JobQueueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueueService")
            .field("config", &self.config)
            .field("queues", &self.queue_list())
            .finish_non_exhaustive()
    }
}
