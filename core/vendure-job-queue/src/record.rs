//! Shared state of one job: the latest snapshot plus one channel per
//! subscriber announcing every change.

use crate::job::JobUpdate;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use vendure_types::JobId;

struct RecordState {
    snapshot: JobUpdate,
    subscribers: Vec<mpsc::UnboundedSender<JobUpdate>>,
}

/// Each subscriber gets its own unbounded channel, so a slow reader still
/// sees every change in order.
pub(crate) struct JobRecord {
    state: Mutex<RecordState>,
}

impl JobRecord {
    pub(crate) fn new(initial: JobUpdate) -> Self {
        Self {
            state: Mutex::new(RecordState {
                snapshot: initial,
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn snapshot(&self) -> JobUpdate {
        self.lock().snapshot.clone()
    }

    /// The current snapshot and a receiver for every later change. Taken
    /// under the lock, so no change is missed or seen twice. The receiver
    /// closes once the job settles.
    pub(crate) fn subscribe(&self) -> (JobUpdate, mpsc::UnboundedReceiver<JobUpdate>) {
        let mut state = self.lock();
        let (tx, rx) = mpsc::unbounded_channel();
        if !state.snapshot.state.is_settled() {
            state.subscribers.push(tx);
        }
        (state.snapshot.clone(), rx)
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Applies `change` and sends the new snapshot to every subscriber.
    /// Settled jobs are never modified again; returns `false` in that case.
    pub(crate) fn update(&self, change: impl FnOnce(&mut JobUpdate)) -> bool {
        self.update_if(|job| {
            change(job);
            true
        })
    }

    /// Like [`update`](Self::update), but only notifies subscribers when
    /// `change` reports that it modified the snapshot.
    pub(crate) fn update_if(&self, change: impl FnOnce(&mut JobUpdate) -> bool) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.snapshot.state.is_settled() || !change(&mut state.snapshot) {
            return false;
        }
        let snapshot = &state.snapshot;
        // Dropped streams are pruned here.
        state
            .subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        if snapshot.state.is_settled() {
            state.subscribers.clear();
        }
        true
    }
}

/// Every job the service has accepted, keyed by id. `JobId` is a UUID v7, so
/// iteration order is submission order.
#[derive(Default)]
pub(crate) struct JobStore {
    records: Mutex<BTreeMap<JobId, Arc<JobRecord>>>,
}

impl JobStore {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<JobId, Arc<JobRecord>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert(&self, id: JobId, record: Arc<JobRecord>) {
        self.lock().insert(id, record);
    }

    pub(crate) fn get(&self, id: &JobId) -> Option<Arc<JobRecord>> {
        self.lock().get(id).cloned()
    }

    pub(crate) fn on_queue(&self, queue_name: &str) -> Vec<JobUpdate> {
        self.lock()
            .values()
            .map(|record| record.snapshot())
            .filter(|job| job.queue_name == queue_name)
            .collect()
    }

    /// Drops settled jobs whose `settled_at` is before `cutoff`.
    pub(crate) fn remove_settled_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| {
            let job = record.snapshot();
            !matches!(job.settled_at, Some(at) if job.state.is_settled() && at < cutoff)
        });
        before - records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobState;

    fn record() -> JobRecord {
        JobRecord::new(JobUpdate::pending(JobId::new(), "test", 0))
    }

    #[test]
    fn every_change_is_queued_for_an_idle_subscriber() {
        let record = record();
        let (initial, mut rx) = record.subscribe();
        assert_eq!(initial.state, JobState::Pending);

        for progress in 1..=200u8 {
            record.update(|job| {
                job.state = JobState::Running;
                job.progress = progress.min(100);
            });
        }
        record.update(|job| job.state = JobState::Completed);

        let mut received = Vec::new();
        while let Ok(update) = rx.try_recv() {
            received.push(update);
        }
        assert_eq!(received.len(), 201);
        assert_eq!(received.last().map(|job| job.state), Some(JobState::Completed));
    }

    #[test]
    fn settling_releases_subscribers() {
        let record = record();
        let (_, mut rx) = record.subscribe();
        let (_, dropped) = record.subscribe();
        drop(dropped);
        record.update(|job| job.state = JobState::Running);
        assert_eq!(record.subscriber_count(), 1);

        record.update(|job| job.state = JobState::Failed);
        assert_eq!(record.subscriber_count(), 0);
        assert_eq!(rx.try_recv().map(|job| job.state), Ok(JobState::Running));
        assert_eq!(rx.try_recv().map(|job| job.state), Ok(JobState::Failed));
        assert_eq!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
    }

    #[test]
    fn subscribing_to_a_settled_job_yields_a_closed_receiver() {
        let record = record();
        record.update(|job| job.state = JobState::Completed);
        let (current, mut rx) = record.subscribe();
        assert_eq!(current.state, JobState::Completed);
        assert_eq!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
        assert_eq!(record.subscriber_count(), 0);
    }
}
