pub mod http;
pub mod status;

use async_trait::async_trait;
use forkstar_schema::{
    BackendStatus, DiscoveryQuery, FilterOptions, FilteredPage, RecommendedRestaurant, Restaurant,
    RestaurantFilter, TrendingRestaurants,
};

pub use http::HttpRestaurantClient;
pub use status::StatusMonitor;

/// Default result count for search, matching the web client.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// A failed call to the restaurant API.
///
/// Transport errors, non-success statuses and undecodable bodies all land
/// here; callers are not expected to tell them apart.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {endpoint}: {reason}")]
pub struct FetchError {
    pub endpoint: String,
    reason: String,
}

impl FetchError {
    pub fn new(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
pub trait RestaurantApi: Send + Sync {
    /// One GET of the full restaurant listing. No retry, no cache.
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, FetchError>;

    async fn search_restaurants(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Restaurant>, FetchError>;

    /// Highest-momentum restaurants from the recommendation service.
    async fn fetch_trending(&self, limit: usize) -> Result<TrendingRestaurants, FetchError>;

    async fn discover_random(
        &self,
        query: &DiscoveryQuery,
    ) -> Result<Vec<RecommendedRestaurant>, FetchError>;

    async fn fetch_filter_options(&self) -> Result<FilterOptions, FetchError>;

    async fn fetch_filtered(&self, filter: &RestaurantFilter) -> Result<FilteredPage, FetchError>;

    /// Probe the API root. Never fails; unreachable is a status.
    async fn check_connection(&self) -> BackendStatus;
}
