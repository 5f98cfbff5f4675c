use super::{JobId, JobStatus, OperationKind, RetrievalJob};
use crate::grant::Grant;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::*;

/// Outcome of [`JobStore::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum Created {
    New(JobId),
    /// A job for the same notetaker and operation is still processing.
    Existing(JobId),
}

impl Created {
    pub fn job_id(&self) -> &JobId {
        match self {
            Created::New(id) | Created::Existing(id) => id,
        }
    }
}

/// Process-wide registry of in-flight retrieval jobs.
///
/// Only the retrieval worker calls `set`; request handlers create and read.
pub trait JobStore: Send + Sync {
    /// Create a processing job, or return the processing job already running for
    /// the same `(notetaker_id, kind)`.
    fn create(&self, notetaker_id: &str, kind: OperationKind, grant: &Grant) -> Created;

    fn get(&self, job_id: &JobId) -> Option<RetrievalJob>;

    /// Resolve a job. Only the first terminal status sticks; later calls return `false`.
    fn set(&self, job_id: &JobId, status: JobStatus) -> bool;

    /// Evict jobs created before `now - retention`. Returns how many were removed.
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `JobStore` backed by sharded concurrent maps.
pub struct InMemoryJobStore {
    jobs: DashMap<JobId, RetrievalJob>,
    processing: DashMap<(String, OperationKind), JobId>,
    retention: Duration,
}

impl InMemoryJobStore {
    pub fn new(retention: std::time::Duration) -> Self {
        Self {
            jobs: DashMap::new(),
            processing: DashMap::new(),
            retention: Duration::from_std(retention).unwrap_or(Duration::hours(1)),
        }
    }

    fn insert_job(&self, notetaker_id: &str, kind: OperationKind, grant: &Grant) -> JobId {
        let job = RetrievalJob::new(notetaker_id, kind, grant.clone());
        let job_id = job.id.clone();
        self.jobs.insert(job_id.clone(), job);
        job_id
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, notetaker_id: &str, kind: OperationKind, grant: &Grant) -> Created {
        // Lock order is always `processing` then `jobs`.
        match self.processing.entry((notetaker_id.to_string(), kind)) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get().clone();
                let still_processing = self
                    .jobs
                    .get(&existing)
                    .is_some_and(|job| !job.status.is_terminal());
                if still_processing {
                    return Created::Existing(existing);
                }
                let job_id = self.insert_job(notetaker_id, kind, grant);
                entry.insert(job_id.clone());
                Created::New(job_id)
            }
            Entry::Vacant(entry) => {
                let job_id = self.insert_job(notetaker_id, kind, grant);
                entry.insert(job_id.clone());
                Created::New(job_id)
            }
        }
    }

    fn get(&self, job_id: &JobId) -> Option<RetrievalJob> {
        self.jobs.get(job_id).map(|job| job.clone())
    }

    fn set(&self, job_id: &JobId, status: JobStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }

        let key = {
            let Some(mut job) = self.jobs.get_mut(job_id) else {
                debug!("Job {job_id} no longer exists; dropping its result");
                return false;
            };
            if job.status.is_terminal() {
                return false;
            }
            job.status = status;
            job.resolved_at = Some(Utc::now());
            (job.notetaker_id.clone(), job.kind)
        };

        self.processing.remove_if(&key, |_, id| id == job_id);
        true
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, job| job.created_at + self.retention > now);
        self.processing
            .retain(|_, job_id| self.jobs.contains_key(job_id));
        before.saturating_sub(self.jobs.len())
    }

    fn len(&self) -> usize {
        self.jobs.len()
    }
}
