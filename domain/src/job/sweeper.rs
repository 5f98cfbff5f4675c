use super::{JobStore, TaskRegistry};
use chrono::Utc;
use log::*;
use std::sync::Arc;
use std::time::Duration;

/// Periodically evict expired jobs until shutdown.
pub fn spawn_sweeper(tasks: &TaskRegistry, store: Arc<dyn JobStore>, every: Duration) {
    tasks.spawn_background(move |shutdown| async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = store.sweep_expired(Utc::now());
                    if removed > 0 {
                        debug!("Evicted {removed} expired retrieval job(s)");
                    }
                }
            }
        }
        debug!("Job sweeper stopped");
    });
}
