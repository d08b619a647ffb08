use super::*;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::state::test_helpers::test_app_state;

async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app(test_app_state())
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
}

#[tokio::test]
async fn healthz_is_ok() {
    let response = app(test_app_state())
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn theme_presets_are_public() {
    let (status, json) = get_json("/api/themes/presets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["colors"].as_array().map(Vec::len), Some(6));
    assert_eq!(json["defaultTheme"]["primaryColor"], "#3b82f6");
    assert_eq!(json["borderRadii"][0], "0px");
    assert!(json.get("default_theme").is_none());
    assert_eq!(json["layouts"][0]["value"], "modern");
}

#[tokio::test]
async fn domain_check_reports_invalid_domains_without_probing() {
    let (status, json) = get_json("/api/domains/check?domain=ab").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], false);
    assert_eq!(json["domain"], "ab");
    assert_eq!(json["error"], "domain must be at least 3 characters");
}

#[tokio::test]
async fn dashboard_routes_require_a_session() {
    for uri in ["/api/sites", "/api/profile", "/api/auth/me"] {
        let (status, json) = get_json(uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(json["error"], "authentication required");
    }
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let response = app(test_app_state())
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn avatar_body_limit_adds_multipart_headroom() {
    assert_eq!(avatar_body_limit(1024), 1024 + profile::MULTIPART_OVERHEAD);
    assert_eq!(avatar_body_limit(usize::MAX - 1), usize::MAX);
}
