use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use forkstar_bus::Observable;
use forkstar_client::{FetchError, RestaurantApi};
use forkstar_core::{AppConfig, RunMode};
use forkstar_schema::{
    BackendStatus, DiscoveryQuery, FilterOptions, FilteredPage, RecommendedRestaurant, Restaurant,
    RestaurantFilter, TrendingRestaurants,
};
use forkstar_server::{create_router, state::AppState};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StubApi {
    fail: bool,
}

#[async_trait]
impl RestaurantApi for StubApi {
    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, FetchError> {
        if self.fail {
            return Err(FetchError::new("/restaurants/", "HTTP 500"));
        }
        Ok(vec![Restaurant::new(1, "Test"), Restaurant::new(2, "Noma")])
    }

    async fn search_restaurants(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Restaurant>, FetchError> {
        if self.fail {
            return Err(FetchError::new("/restaurants/search", "HTTP 500"));
        }
        Ok(vec![Restaurant::new(limit as i64, query)])
    }

    async fn fetch_trending(&self, _limit: usize) -> Result<TrendingRestaurants, FetchError> {
        Ok(TrendingRestaurants::default())
    }

    async fn discover_random(
        &self,
        _query: &DiscoveryQuery,
    ) -> Result<Vec<RecommendedRestaurant>, FetchError> {
        Ok(Vec::new())
    }

    async fn fetch_filter_options(&self) -> Result<FilterOptions, FetchError> {
        Ok(FilterOptions::default())
    }

    async fn fetch_filtered(&self, _filter: &RestaurantFilter) -> Result<FilteredPage, FetchError> {
        Ok(FilteredPage::default())
    }

    async fn check_connection(&self) -> BackendStatus {
        BackendStatus::Checking
    }
}

fn state_with(config: AppConfig, fail: bool) -> AppState {
    let status = Observable::new(BackendStatus::Checking);
    AppState::new(config, Arc::new(StubApi { fail }), status.reader()).unwrap()
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn healthz_answers_ok() {
    let app = create_router(state_with(AppConfig::default(), false));
    let (status, _, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn restaurant_listing_is_passed_through() {
    let app = create_router(state_with(AppConfig::default(), false));
    let (status, _, body) = get(app, "/api/restaurants").await;
    assert_eq!(status, StatusCode::OK);

    let list: Vec<Restaurant> = serde_json::from_slice(&body).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].name, "Test");
}

#[tokio::test]
async fn failed_listing_maps_to_bad_gateway() {
    let app = create_router(state_with(AppConfig::default(), true));
    let (status, _, _) = get(app, "/api/restaurants").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn search_uses_default_limit_and_rejects_blank_query() {
    let app = create_router(state_with(AppConfig::default(), false));
    let (status, _, body) = get(app.clone(), "/api/restaurants/search?q=noma").await;
    assert_eq!(status, StatusCode::OK);
    let list: Vec<Restaurant> = serde_json::from_slice(&body).unwrap();
    assert_eq!(list[0].name, "noma");
    assert_eq!(list[0].id, 10);

    let (status, _, _) = get(app, "/api/restaurants/search?q=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_reports_latest_check() {
    let status = Observable::new(BackendStatus::Checking);
    let state = AppState::new(
        AppConfig::default(),
        Arc::new(StubApi { fail: false }),
        status.reader(),
    )
    .unwrap();
    status.set(BackendStatus::Error {
        code: 503,
        checked_at: chrono::Utc::now(),
    });

    let (code, _, body) = get(create_router(state), "/api/status").await;
    assert_eq!(code, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "error");
    assert_eq!(value["code"], 503);
}

#[tokio::test]
async fn sounds_are_served_from_asset_dir() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("sounds")).unwrap();
    std::fs::write(temp.path().join("sounds/click.wav"), b"RIFF....WAVE").unwrap();

    let mut config = AppConfig::default();
    config.assets.dir = temp.path().to_path_buf();
    let app = create_router(state_with(config, false));

    let (status, _, body) = get(app.clone(), "/sounds/click.wav").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"RIFF....WAVE");

    let (status, _, _) = get(app, "/sounds/missing.wav").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn image_proxy_enforces_allow_list() {
    let app = create_router(state_with(AppConfig::default(), false));

    let (status, _, _) = get(
        app.clone(),
        "/api/image?url=https%3A%2F%2Fevil.example.org%2Fa.png",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = get(app, "/api/image?url=not-a-url").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_proxy_fetches_allowed_host() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hero.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let mut config = AppConfig::default();
    config.images.domains = vec!["127.0.0.1".to_string()];
    let app = create_router(state_with(config, false));

    let target = format!("{}/hero.jpg", upstream.uri());
    let uri = format!("/api/image?url={}", urlencode(&target));
    let (status, headers, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body, vec![0xFF, 0xD8, 0xFF]);
}

fn localhost_only(max_bytes: Option<u64>) -> AppConfig {
    let mut config = AppConfig::default();
    config.images.domains = vec!["localhost".to_string()];
    if let Some(max) = max_bytes {
        config.images.max_bytes = max;
    }
    config
}

#[tokio::test]
async fn image_redirect_off_allow_list_is_not_followed() {
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("INTERNAL-SECRET"))
        .expect(0)
        .mount(&internal)
        .await;

    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img.png"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/secret", internal.uri()).as_str()),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = create_router(state_with(localhost_only(None), false));
    let target = format!("http://localhost:{}/img.png", upstream.address().port());
    let (status, _, body) = get(app, &format!("/api/image?url={}", urlencode(&target))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!String::from_utf8_lossy(&body).contains("INTERNAL-SECRET"));
    internal.verify().await;
}

#[tokio::test]
async fn image_redirect_within_allow_list_is_followed() {
    let upstream = MockServer::start().await;
    let port = upstream.address().port();
    Mock::given(method("GET"))
        .and(path("/old.png"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("http://localhost:{port}/new.png").as_str()),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/new.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = create_router(state_with(localhost_only(None), false));
    let target = format!("http://localhost:{port}/old.png");
    let (status, headers, body) =
        get(app, &format!("/api/image?url={}", urlencode(&target))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(body, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0u8; 64]),
        )
        .mount(&upstream)
        .await;

    let app = create_router(state_with(localhost_only(Some(16)), false));
    let target = format!("http://localhost:{}/huge.jpg", upstream.address().port());
    let (status, _, body) = get(app, &format!("/api/image?url={}", urlencode(&target))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.len() < 64);
}

#[tokio::test]
async fn cors_only_in_development() {
    let request = || {
        Request::builder()
            .uri("/healthz")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap()
    };

    let dev = create_router(state_with(AppConfig::default(), false));
    let resp = dev.oneshot(request()).await.unwrap();
    assert!(resp
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let mut config = AppConfig::default();
    config.mode = RunMode::Production;
    let prod = create_router(state_with(config, false));
    let resp = prod.oneshot(request()).await.unwrap();
    assert!(!resp
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

fn urlencode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
