use domain::job::{spawn_sweeper, InMemoryJobStore, JobStore, TaskRegistry};
use log::{error, info, warn};
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting notetaker relay [{}]...", config.nylas_base_url());

    let tasks = TaskRegistry::new();
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new(config.job_retention()));
    spawn_sweeper(&tasks, store.clone(), config.job_sweep_interval());

    let shutdown_grace = config.shutdown_grace();
    let app_state = match AppState::new(config, tasks.clone(), store) {
        Ok(app_state) => app_state,
        Err(e) => {
            error!("Failed to build application state: {e:?}");
            std::process::exit(1);
        }
    };

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with error: {e}");
    }

    if !tasks.shutdown(shutdown_grace).await {
        warn!("Background work did not finish within {shutdown_grace:?}");
    }
    info!("Notetaker relay stopped");
}
