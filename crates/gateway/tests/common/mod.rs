//! Test utilities and common setup.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use sangat_common::{
    auth::AuthState,
    chat::{ChatService, GenerativeBackend, MockGenerativeBackend},
    config::AppConfig,
    gurbani::{MockGurbaniSource, SearchService},
    seva::{InMemorySevaStore, SevaService},
};
use sangat_gateway::{create_router, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Router plus handles on the recording upstream mocks
pub struct TestApp {
    pub router: Router,
    pub generative: Arc<MockGenerativeBackend>,
    pub gurbani: Arc<MockGurbaniSource>,
}

/// Test app with a generative key and the given Gurbani script
pub fn test_app_with(gurbani: MockGurbaniSource) -> TestApp {
    build(gurbani, true, Some(TEST_JWT_SECRET))
}

/// Test app with a generative key and an unscripted Gurbani source
pub fn test_app() -> TestApp {
    test_app_with(MockGurbaniSource::new())
}

/// Test app with no generative credential configured
pub fn test_app_without_key() -> TestApp {
    build(MockGurbaniSource::new(), false, Some(TEST_JWT_SECRET))
}

/// Test app with no JWT secret configured
pub fn test_app_without_auth() -> TestApp {
    build(MockGurbaniSource::new(), true, None)
}

fn build(gurbani: MockGurbaniSource, with_key: bool, jwt_secret: Option<&str>) -> TestApp {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;

    let generative = Arc::new(MockGenerativeBackend::new("Waheguru Ji Ki Fateh"));
    let backend: Option<Arc<dyn GenerativeBackend>> = if with_key {
        Some(generative.clone())
    } else {
        None
    };
    let gurbani = Arc::new(gurbani);

    let state = AppState {
        chat: Arc::new(ChatService::new(backend, config.generative.history_window)),
        search: Arc::new(SearchService::new(gurbani.clone())),
        seva: Arc::new(SevaService::new(Arc::new(InMemorySevaStore::new()))),
        auth: AuthState::from_secret(jwt_secret, config.auth.jwt_expiration_secs),
        config: Arc::new(config),
    };

    TestApp {
        router: create_router(state),
        generative,
        gurbani,
    }
}

/// Send a request and decode the JSON body (Null when the body is empty)
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, headers, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Sign in as a fresh guest and return the token
pub async fn guest_token(router: &Router) -> String {
    let (status, _, json) = send(
        router,
        post_json("/api/auth/guest", &serde_json::json!({}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["token"].as_str().unwrap().to_string()
}
