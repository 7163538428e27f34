use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::error;

use crate::{application::use_cases::subscription::SubscriptionUseCases, infra::config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
}

/// Application state plus the background job worker it feeds.
pub struct AppRuntime {
    pub state: AppState,
    worker: JoinHandle<()>,
}

impl AppRuntime {
    pub fn new(state: AppState, worker: JoinHandle<()>) -> Self {
        Self { state, worker }
    }

    /// Drops the state, which closes the job queue, then waits until every queued
    /// job has been handed to the sink.
    pub async fn shutdown(self) {
        let Self { state, worker } = self;
        drop(state);

        if let Err(e) = worker.await {
            error!(error = %e, "Job dispatch worker panicked");
        }
    }
}
