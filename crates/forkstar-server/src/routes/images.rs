use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use forkstar_core::ImagesConfig;
use reqwest::redirect::Policy;
use serde::Deserialize;

use crate::state::AppState;

const MAX_REDIRECTS: usize = 5;

/// HTTP client for the image proxy. Redirects are followed only while every
/// hop stays on the allow-list; any other hop hands the redirect response
/// back unfollowed.
pub fn image_client(images: &ImagesConfig) -> reqwest::Result<reqwest::Client> {
    let allowed = images.clone();
    let policy = Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if allowed.allows_url(attempt.url().as_str()) {
            attempt.follow()
        } else {
            tracing::warn!(location = %attempt.url(), "image redirect leaves the allow-list");
            attempt.stop()
        }
    });
    reqwest::Client::builder().redirect(policy).build()
}

#[derive(Deserialize)]
pub struct ImageParams {
    pub url: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(proxy_image))
}

/// Fetch a remote image, but only from hosts on the configured allow-list.
async fn proxy_image(
    State(state): State<AppState>,
    Query(params): Query<ImageParams>,
) -> Result<Response, StatusCode> {
    let parsed = url::Url::parse(&params.url).map_err(|_| StatusCode::BAD_REQUEST)?;
    if !state.config.images.allows_url(&params.url) {
        tracing::debug!(host = ?parsed.host_str(), "image host not allowed");
        return Err(StatusCode::FORBIDDEN);
    }

    let mut resp = state.http.get(parsed.clone()).send().await.map_err(|e| {
        tracing::warn!("image fetch failed for {parsed}: {e}");
        StatusCode::BAD_GATEWAY
    })?;
    if !resp.status().is_success() {
        tracing::warn!("image fetch for {parsed} returned {}", resp.status());
        return Err(StatusCode::BAD_GATEWAY);
    }

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(parsed.path())
                .first_or_octet_stream()
                .to_string()
        });

    let limit = state.config.images.max_bytes;
    if resp.content_length().is_some_and(|len| len > limit) {
        tracing::warn!("image {parsed} exceeds {limit} bytes");
        return Err(StatusCode::BAD_GATEWAY);
    }
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await.map_err(|_| StatusCode::BAD_GATEWAY)? {
        if (body.len() + chunk.len()) as u64 > limit {
            tracing::warn!("image {parsed} exceeds {limit} bytes");
            return Err(StatusCode::BAD_GATEWAY);
        }
        body.extend_from_slice(&chunk);
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=60".to_string()),
        ],
        body,
    )
        .into_response())
}
