use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A restaurant record as returned by the listing and search endpoints.
///
/// Only `id` and `name` are guaranteed by the API; everything else is
/// optional and unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub awards: Vec<String>,
    #[serde(default)]
    pub source_lists: Vec<String>,
}

impl Restaurant {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            country: None,
            city: None,
            latitude: None,
            longitude: None,
            cuisine: None,
            description: None,
            image_url: None,
            awards: Vec::new(),
            source_lists: Vec::new(),
        }
    }

    /// "City, Country" with whichever parts are known.
    pub fn location_label(&self) -> Option<String> {
        match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }
}

/// Identifier of a recommendation row. The recommendation endpoints return
/// either numeric or string ids depending on the source table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A row from the recommendation endpoints (trending, random discovery,
/// filtered search). Scores are present only on the endpoints that rank by
/// them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedRestaurant {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub stars: Option<f64>,
    #[serde(default)]
    pub score_color: Option<String>,
    /// Badge list as a single delimited string.
    #[serde(default)]
    pub badges: Option<String>,
    #[serde(default)]
    pub reputation: Option<String>,
    #[serde(default)]
    pub momentum_score: Option<f64>,
    #[serde(default)]
    pub calculated_score: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub cluster: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendingRestaurants {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "trending_restaurants")]
    pub restaurants: Vec<RecommendedRestaurant>,
}

/// Distinct values available to the filter UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterOptions {
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub reputations: Vec<String>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub clusters: Vec<i64>,
}

/// The "All" choice in filter dropdowns; never sent as a filter value.
pub const FILTER_ALL: &str = "All";

/// Multi-criteria filter. Unset fields and the `All` sentinel are omitted
/// from the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantFilter {
    pub cuisine: Option<String>,
    pub country: Option<String>,
    pub reputation: Option<String>,
    pub min_stars: Option<f64>,
    pub max_stars: Option<f64>,
    pub badge: Option<String>,
    pub cluster: Option<i64>,
    pub score_color: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl RestaurantFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let mut text = |key: &'static str, value: &Option<String>| {
            if let Some(v) = value.as_deref() {
                if !v.is_empty() && v != FILTER_ALL {
                    pairs.push((key, v.to_string()));
                }
            }
        };
        text("cuisine", &self.cuisine);
        text("country", &self.country);
        text("reputation", &self.reputation);
        text("badge", &self.badge);
        text("score_color", &self.score_color);
        if let Some(v) = self.min_stars {
            pairs.push(("min_stars", v.to_string()));
        }
        if let Some(v) = self.max_stars {
            pairs.push(("max_stars", v.to_string()));
        }
        if let Some(v) = self.cluster {
            pairs.push(("cluster", v.to_string()));
        }
        if let Some(v) = self.page {
            pairs.push(("page", v.to_string()));
        }
        if let Some(v) = self.limit {
            pairs.push(("limit", v.to_string()));
        }
        pairs
    }
}

/// One page of filtered results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilteredPage {
    #[serde(default)]
    pub restaurants: Vec<RecommendedRestaurant>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Parameters for random discovery. `count` defaults to 5.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryQuery {
    pub count: usize,
    pub min_stars: Option<f64>,
    pub cuisine: Option<String>,
    pub country: Option<String>,
}

impl Default for DiscoveryQuery {
    fn default() -> Self {
        Self {
            count: 5,
            min_stars: None,
            cuisine: None,
            country: None,
        }
    }
}

impl DiscoveryQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("count", self.count.to_string())];
        if let Some(v) = self.min_stars {
            pairs.push(("min_stars", v.to_string()));
        }
        if let Some(v) = self.cuisine.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("cuisine", v.to_string()));
        }
        if let Some(v) = self.country.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("country", v.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

/// One observation of document scroll state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct ScrollSnapshot {
    /// Current vertical offset in pixels, never negative.
    pub vertical_offset: f64,
    /// Normalized progress through the scrollable range, in `[0, 1]`.
    pub progress: f64,
    pub direction: ScrollDirection,
    /// True from a scroll notification until the idle interval elapses.
    pub is_active: bool,
}

/// Reachability of the restaurant API as last observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BackendStatus {
    Checking,
    Connected {
        checked_at: DateTime<Utc>,
    },
    /// The API answered with a non-success status.
    Error {
        code: u16,
        checked_at: DateTime<Utc>,
    },
    /// The API could not be reached at all.
    Disconnected {
        error: String,
        checked_at: DateTime<Utc>,
    },
}

impl BackendStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Connected { .. } => "connected",
            Self::Error { .. } => "error",
            Self::Disconnected { .. } => "disconnected",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Checking => "Checking backend status...".to_string(),
            Self::Connected { .. } => "Backend is running correctly".to_string(),
            Self::Error { code, .. } => format!("Backend error: HTTP {code}"),
            Self::Disconnected { error, .. } => format!("Backend is not running: {error}"),
        }
    }
}
