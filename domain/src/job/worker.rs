//! Background retrieval of one notetaker's recording.

use super::{JobId, JobStatus, JobStore};
use crate::grant::Grant;
use crate::notetaker::NotetakerRegistry;
use crate::polling::{Check, PollOutcome, PollPolicy};
use crate::recording::{NOT_AVAILABLE, NO_RECORDING_URL};
use log::*;
use meeting_ai::traits::notetaker;
use meeting_ai::types::notetaker::Media;
use meeting_ai::Status;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub(crate) const ABORTED: &str = "Retrieval worker aborted";
pub(crate) const CANCELLED: &str = "Retrieval cancelled";

/// The worker's exclusive write access to its job.
///
/// If the worker returns early or panics without resolving, dropping the handle
/// fails the job so pollers never wait on it forever.
pub(crate) struct JobHandle {
    store: Arc<dyn JobStore>,
    notetakers: Arc<NotetakerRegistry>,
    job_id: JobId,
    notetaker_id: String,
    resolved: bool,
}

impl JobHandle {
    pub(crate) fn new(
        store: Arc<dyn JobStore>,
        notetakers: Arc<NotetakerRegistry>,
        job_id: JobId,
        notetaker_id: String,
    ) -> Self {
        Self {
            store,
            notetakers,
            job_id,
            notetaker_id,
            resolved: false,
        }
    }

    fn resolve(mut self, status: JobStatus) {
        self.write(status);
    }

    fn write(&mut self, status: JobStatus) {
        self.resolved = true;
        let next = match status {
            JobStatus::Completed { .. } => Status::RecordingReady,
            _ => Status::Failed,
        };
        match &status {
            JobStatus::Completed { .. } => info!("Job {} completed", self.job_id),
            other => warn!("Job {} resolved as {}", self.job_id, other.as_str()),
        }
        if self.store.set(&self.job_id, status) {
            self.notetakers.advance(&self.notetaker_id, next);
        }
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if !self.resolved {
            error!("Retrieval worker for job {} ended without a result", self.job_id);
            self.write(JobStatus::Failed {
                reason: ABORTED.to_string(),
            });
        }
    }
}

/// Resolve one retrieval job: locate the media, or explain why there is none.
pub(crate) async fn retrieve(
    handle: JobHandle,
    provider: Arc<dyn notetaker::Provider>,
    grant: Grant,
    policy: PollPolicy,
    cancel: CancellationToken,
) {
    handle
        .notetakers
        .advance(&handle.notetaker_id, Status::RecordingPending);
    debug!(
        "Job {} fetching media for notetaker {} (grant {})",
        handle.job_id,
        handle.notetaker_id,
        grant.fingerprint()
    );

    let status = tokio::select! {
        _ = cancel.cancelled() => JobStatus::Failed { reason: CANCELLED.to_string() },
        status = locate_media(provider.as_ref(), &grant, &handle.notetaker_id, policy) => status,
    };
    handle.resolve(status);
}

async fn locate_media(
    provider: &dyn notetaker::Provider,
    grant: &Grant,
    notetaker_id: &str,
    policy: PollPolicy,
) -> JobStatus {
    let outcome = policy
        .run(move || async move {
            match provider.media(grant.expose(), notetaker_id).await {
                Err(meeting_ai::Error::NotFound(_)) => Check::NotYet,
                other => Check::Ready(other),
            }
        })
        .await;

    match outcome {
        PollOutcome::Ready(Ok(Media {
            recording_url: Some(url),
        })) if !url.trim().is_empty() => JobStatus::Completed { url },
        PollOutcome::Ready(Ok(_)) => JobStatus::Failed {
            reason: NO_RECORDING_URL.to_string(),
        },
        PollOutcome::Ready(Err(e)) => JobStatus::Failed {
            reason: e.to_string(),
        },
        PollOutcome::TimedOut { attempts } => {
            debug!("No media for notetaker {notetaker_id} after {attempts} attempt(s)");
            JobStatus::Failed {
                reason: NOT_AVAILABLE.to_string(),
            }
        }
    }
}
