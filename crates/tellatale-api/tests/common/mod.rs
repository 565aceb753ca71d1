//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tellatale_core::backend::StoryBackend;
use tellatale_story::application::generator::{GeneratorConfig, StoryGenerator};
use tellatale_story::application::model_resolution::FallbackModelResolver;
use tellatale_story::domain::prompt::PromptComposer;
use tellatale_test_support::test_api_key;
use tower::ServiceExt;

use tellatale_api::state::AppState;

/// Build the full app router around `backend` with a configured credential.
pub fn build_test_app(backend: Arc<dyn StoryBackend>) -> Router {
    build_test_app_with_config(backend, GeneratorConfig::new(Some(test_api_key())))
}

/// Build the full app router around `backend` with no credential.
pub fn build_unconfigured_app(backend: Arc<dyn StoryBackend>) -> Router {
    build_test_app_with_config(backend, GeneratorConfig::new(None))
}

/// Build the full app router with a custom generator configuration.
pub fn build_test_app_with_config(backend: Arc<dyn StoryBackend>, config: GeneratorConfig) -> Router {
    let resolver = Arc::new(FallbackModelResolver::new("gemini-1.5-flash", "gemini-pro"));
    let generator = StoryGenerator::new(config, backend, resolver);
    tellatale_api::app(AppState::new(generator, PromptComposer::default()))
}

/// Send a POST request with a JSON body and return status and raw body.
pub async fn post_raw(app: Router, uri: &str, body: &serde_json::Value) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, body_bytes.to_vec())
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let (status, bytes) = post_raw(app, uri, body).await;
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    (status, json)
}

/// Send a GET request and return status and raw body.
pub async fn get_raw(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, body_bytes.to_vec())
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, bytes) = get_raw(app, uri).await;
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    (status, json)
}
