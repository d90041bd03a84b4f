use async_trait::async_trait;
use chrono::Utc;
use forkstar_schema::{
    BackendStatus, DiscoveryQuery, FilterOptions, FilteredPage, RecommendedRestaurant, Restaurant,
    RestaurantFilter, TrendingRestaurants,
};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::{FetchError, RestaurantApi};

#[derive(Debug, Clone)]
pub struct HttpRestaurantClient {
    client: reqwest::Client,
    api_base: String,
}

impl HttpRestaurantClient {
    /// No request timeout is configured; the transport defaults apply.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_base)
    }

    pub fn with_client(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let endpoint = url.path().to_string();
        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::new(&endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::new(&endpoint, format!("HTTP {status}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| FetchError::new(&endpoint, e))
    }

    fn url_with(&self, path: &str, pairs: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self.url(path)?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        Url::parse(&format!("{}{path}", self.api_base)).map_err(|e| FetchError::new(path, e))
    }
}

#[async_trait]
impl RestaurantApi for HttpRestaurantClient {
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, FetchError> {
        let url = self.url("/restaurants/")?;
        let restaurants = self.get_json::<Vec<Restaurant>>(url).await.inspect_err(|e| {
            tracing::warn!("restaurant listing failed: {e}");
        })?;
        tracing::debug!(count = restaurants.len(), "fetched restaurants");
        Ok(restaurants)
    }

    async fn search_restaurants(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Restaurant>, FetchError> {
        let url = self.url_with(
            "/restaurants/search",
            &[("q", query.to_string()), ("limit", limit.to_string())],
        )?;
        let restaurants = self.get_json::<Vec<Restaurant>>(url).await?;
        tracing::debug!(query, count = restaurants.len(), "restaurant search");
        Ok(restaurants)
    }

    async fn fetch_trending(&self, limit: usize) -> Result<TrendingRestaurants, FetchError> {
        let url = self.url_with("/recommendations/trending", &[("limit", limit.to_string())])?;
        let trending: TrendingRestaurants = self.get_json(url).await?;
        tracing::debug!(count = trending.restaurants.len(), "fetched trending restaurants");
        Ok(trending)
    }

    async fn discover_random(
        &self,
        query: &DiscoveryQuery,
    ) -> Result<Vec<RecommendedRestaurant>, FetchError> {
        let url = self.url_with("/recommendations/discover/random", &query.query_pairs())?;
        self.get_json(url).await
    }

    async fn fetch_filter_options(&self) -> Result<FilterOptions, FetchError> {
        let url = self.url("/recommendations/filters/options")?;
        self.get_json(url).await
    }

    async fn fetch_filtered(&self, filter: &RestaurantFilter) -> Result<FilteredPage, FetchError> {
        let url = self.url_with("/recommendations/filter", &filter.query_pairs())?;
        let page: FilteredPage = self.get_json(url).await?;
        tracing::debug!(
            page = page.page,
            total = page.total_results,
            "fetched filtered restaurants"
        );
        Ok(page)
    }

    async fn check_connection(&self) -> BackendStatus {
        let url = format!("{}/", self.api_base);
        let checked_at = Utc::now();
        match self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => BackendStatus::Connected { checked_at },
            Ok(resp) => {
                let code = resp.status().as_u16();
                tracing::warn!("backend at {} answered HTTP {code}", self.api_base);
                BackendStatus::Error { code, checked_at }
            }
            Err(e) => {
                tracing::warn!("backend at {} unreachable: {e}", self.api_base);
                BackendStatus::Disconnected {
                    error: e.to_string(),
                    checked_at,
                }
            }
        }
    }
}
