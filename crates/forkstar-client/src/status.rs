use std::sync::Arc;

use forkstar_bus::{Observable, ObservableReader};
use forkstar_scheduler::PeriodicTask;
use forkstar_schema::BackendStatus;
use tokio::time::Duration;

use crate::RestaurantApi;

/// Polls the API root on a fixed interval and publishes the result.
///
/// Each check publishes `Checking` first, then the outcome. The first check
/// runs as soon as the monitor starts.
pub struct StatusMonitor {
    status: Observable<BackendStatus>,
    task: PeriodicTask,
}

impl StatusMonitor {
    pub fn start(api: Arc<dyn RestaurantApi>, interval: Duration) -> Self {
        let status = Observable::new(BackendStatus::Checking);
        let publish = status.clone();
        let task = PeriodicTask::spawn("backend-status", interval, move || {
            let api = Arc::clone(&api);
            let publish = publish.clone();
            async move {
                publish.set(BackendStatus::Checking);
                let result = api.check_connection().await;
                if result.is_connected() {
                    tracing::debug!("backend status: {}", result.label());
                } else {
                    tracing::info!("backend status: {}", result.message());
                }
                publish.set(result);
            }
        });
        Self { status, task }
    }

    pub fn status(&self) -> BackendStatus {
        self.status.get()
    }

    pub fn reader(&self) -> ObservableReader<BackendStatus> {
        self.status.reader()
    }

    pub async fn shutdown(self) {
        self.task.shutdown().await;
    }
}
