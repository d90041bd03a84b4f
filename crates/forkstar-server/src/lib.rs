pub mod routes;
pub mod state;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let sounds = ServeDir::new(state.config.assets.dir.join("sounds"));

    let mut router = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api", routes::api_router())
        .nest_service("/sounds", sounds);

    if !state.config.mode.is_production() {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr();
    let port = state.config.server.port;
    let mode = state.config.mode;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(?mode, "forkstar-server listening on {addr}");
    tracing::info!("Ready on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("forkstar-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
