use axum::{extract::State, routing::get, Json, Router};
use forkstar_schema::BackendStatus;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(backend_status))
}

async fn backend_status(State(state): State<AppState>) -> Json<BackendStatus> {
    Json(state.backend_status.get())
}
