use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use forkstar_client::DEFAULT_SEARCH_LIMIT;
use forkstar_schema::Restaurant;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_restaurants))
        .route("/search", get(search_restaurants))
}

async fn list_restaurants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Restaurant>>, StatusCode> {
    match state.api.fetch_restaurants().await {
        Ok(list) => Ok(Json(list)),
        Err(e) => {
            tracing::warn!("listing proxy failed: {e}");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

async fn search_restaurants(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Restaurant>>, StatusCode> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    match state.api.search_restaurants(query, limit).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => {
            tracing::warn!("search proxy failed: {e}");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}
