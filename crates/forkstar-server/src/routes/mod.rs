pub mod images;
pub mod restaurants;
pub mod status;

use axum::Router;

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/restaurants", restaurants::router())
        .nest("/status", status::router())
        .nest("/image", images::router())
}
