//! Asynchronous recording retrieval jobs.
//!
//! A client asks for a recording, gets a job id back immediately, and polls the
//! job until a background worker resolves it. Jobs live only in memory and are
//! evicted after a retention window.

use crate::error::{DomainErrorKind, Error, InternalErrorKind, RequestErrorKind};
use crate::grant::Grant;
use crate::notetaker::NotetakerRegistry;
use crate::polling::{Check, PollOutcome, PollPolicy};
use chrono::{DateTime, Utc};
use log::*;
use meeting_ai::traits::notetaker;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

mod store;
mod sweeper;
mod task_registry;
mod worker;

pub use store::{Created, InMemoryJobStore, JobStore};
pub use sweeper::spawn_sweeper;
pub use task_registry::TaskRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a job is retrieving. Part of the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    RecordingLink,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Processing,
    Completed { url: String },
    Failed { reason: String },
    /// A bounded wait gave up before the job resolved. Never stored.
    TimedOut,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Failed { .. } => "error",
            JobStatus::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            JobStatus::Completed { url } => Some(url),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            JobStatus::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalJob {
    pub id: JobId,
    pub notetaker_id: String,
    pub kind: OperationKind,
    pub grant: Grant,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl RetrievalJob {
    fn new(notetaker_id: &str, kind: OperationKind, grant: Grant) -> Self {
        Self {
            id: JobId::new(),
            notetaker_id: notetaker_id.to_string(),
            kind,
            grant,
            status: JobStatus::Processing,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

/// Entry point for everything a request handler does with retrieval jobs.
#[derive(Clone)]
pub struct RecordingJobs {
    store: Arc<dyn JobStore>,
    tasks: TaskRegistry,
    notetakers: Arc<NotetakerRegistry>,
    provider: Arc<dyn notetaker::Provider>,
    media_policy: PollPolicy,
}

impl RecordingJobs {
    pub fn new(
        store: Arc<dyn JobStore>,
        tasks: TaskRegistry,
        notetakers: Arc<NotetakerRegistry>,
        provider: Arc<dyn notetaker::Provider>,
        media_policy: PollPolicy,
    ) -> Self {
        Self {
            store,
            tasks,
            notetakers,
            provider,
            media_policy,
        }
    }

    /// Start retrieving a notetaker's recording, or join the retrieval already running.
    ///
    /// Never waits on upstream: the worker is spawned and the processing job returned.
    pub fn request_link(
        &self,
        grant: &Grant,
        notetaker_id: Option<&str>,
    ) -> Result<RetrievalJob, Error> {
        let notetaker_id = notetaker_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid("Missing notetakerId"))?;

        let created = self
            .store
            .create(notetaker_id, OperationKind::RecordingLink, grant);

        match &created {
            Created::Existing(job_id) => {
                debug!("Reusing processing job {job_id} for notetaker {notetaker_id}");
            }
            Created::New(job_id) => {
                info!("Created job {job_id} for notetaker {notetaker_id}");
                let handle = worker::JobHandle::new(
                    self.store.clone(),
                    self.notetakers.clone(),
                    job_id.clone(),
                    notetaker_id.to_string(),
                );
                let provider = self.provider.clone();
                let grant = grant.clone();
                let policy = self.media_policy;
                self.tasks.spawn_job(job_id.clone(), move |cancel| {
                    worker::retrieve(handle, provider, grant, policy, cancel)
                });
            }
        }

        self.snapshot(created.job_id().as_str())
    }

    pub fn snapshot(&self, job_id: &str) -> Result<RetrievalJob, Error> {
        self.store
            .get(&JobId::from(job_id))
            .ok_or_else(|| Error::not_found("Job not found"))
    }

    /// Poll the job under `policy` until it resolves.
    ///
    /// If the budget runs out first, the returned snapshot carries `JobStatus::TimedOut`.
    pub async fn wait(&self, job_id: &str, policy: PollPolicy) -> Result<RetrievalJob, Error> {
        let outcome = policy
            .run(move || async move {
                match self.snapshot(job_id) {
                    Ok(job) if !job.status.is_terminal() => Check::NotYet,
                    other => Check::Ready(other),
                }
            })
            .await;

        match outcome {
            PollOutcome::Ready(result) => result,
            PollOutcome::TimedOut { attempts } => {
                debug!("Gave up waiting on job {job_id} after {attempts} attempt(s)");
                let mut job = self.snapshot(job_id)?;
                if !job.status.is_terminal() {
                    job.status = JobStatus::TimedOut;
                }
                Ok(job)
            }
        }
    }

    pub fn cancel(&self, job_id: &str) -> bool {
        self.tasks.cancel(&JobId::from(job_id))
    }
}

/// True when a job lookup failed because the id is unknown or evicted.
pub fn is_missing_job(err: &Error) -> bool {
    matches!(
        err.error_kind,
        DomainErrorKind::Internal(InternalErrorKind::Request(RequestErrorKind::NotFound(_)))
    )
}
