//! Integration tests for the health endpoint and the web page.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use tellatale_test_support::ScriptedBackend;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let app = common::build_test_app(Arc::new(ScriptedBackend::replying("unused")));

    let (status, json) = common::get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["generator_configured"], true);
}

#[tokio::test]
async fn test_health_reports_missing_credential() {
    let app = common::build_unconfigured_app(Arc::new(ScriptedBackend::replying("unused")));

    let (status, json) = common::get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["generator_configured"], false);
}

#[tokio::test]
async fn test_index_serves_web_page() {
    let app = common::build_test_app(Arc::new(ScriptedBackend::replying("unused")));

    let (status, body) = common::get_raw(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/generate_tale/stream"));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = common::build_test_app(Arc::new(ScriptedBackend::replying("unused")));

    let (status, _) = common::get_raw(app, "/api/v1/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
