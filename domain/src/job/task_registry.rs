use super::JobId;
use dashmap::DashMap;
use log::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Tracks every background task so shutdown can cancel and await them.
///
/// Each retrieval job gets a child of the shutdown token, so a job can be
/// cancelled alone or together with everything else.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tracker: TaskTracker,
    shutdown: CancellationToken,
    jobs: Arc<DashMap<JobId, CancellationToken>>,
}

struct Deregister {
    jobs: Arc<DashMap<JobId, CancellationToken>>,
    job_id: JobId,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.jobs.remove(&self.job_id);
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the worker for `job_id`, handing it its cancellation token.
    pub fn spawn_job<F, Fut>(&self, job_id: JobId, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.child_token();
        self.jobs.insert(job_id.clone(), token.clone());
        let deregister = Deregister {
            jobs: self.jobs.clone(),
            job_id,
        };
        let work = task(token);
        self.tracker.spawn(async move {
            let _deregister = deregister;
            work.await;
        });
    }

    /// Spawn a long-running background task that stops when shutdown begins.
    pub fn spawn_background<F, Fut>(&self, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task(self.shutdown.clone()));
    }

    pub fn cancel(&self, job_id: &JobId) -> bool {
        match self.jobs.get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Cancel everything and wait up to `grace` for tasks to finish.
    ///
    /// Returns `false` if some tasks were still running when the grace period ended.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        info!(
            "Cancelling {} outstanding retrieval job(s)",
            self.active_jobs()
        );
        self.shutdown.cancel();
        self.tracker.close();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!("Background tasks still running after {grace:?}");
                false
            }
        }
    }
}
