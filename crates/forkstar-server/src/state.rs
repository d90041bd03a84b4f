use std::sync::Arc;

use anyhow::{Context, Result};
use forkstar_bus::ObservableReader;
use forkstar_client::RestaurantApi;
use forkstar_core::AppConfig;
use forkstar_schema::BackendStatus;

use crate::routes::images::image_client;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Restaurant API the `/api/restaurants` routes pass through to.
    pub api: Arc<dyn RestaurantApi>,
    /// Latest result of the backend reachability check.
    pub backend_status: ObservableReader<BackendStatus>,
    /// Client for fetching allow-listed remote images.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        api: Arc<dyn RestaurantApi>,
        backend_status: ObservableReader<BackendStatus>,
    ) -> Result<Self> {
        let http = image_client(&config.images).context("failed to build image client")?;
        Ok(Self {
            config: Arc::new(config),
            api,
            backend_status,
            http,
        })
    }
}
