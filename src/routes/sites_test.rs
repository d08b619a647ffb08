use super::*;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use time::OffsetDateTime;
use tower::ServiceExt;

use crate::routes::app;
use crate::state::test_helpers::test_app_state;

fn row(theme: serde_json::Value) -> SiteRow {
    SiteRow {
        id: Uuid::nil(),
        user_id: Uuid::nil(),
        name: "Docs".into(),
        description: None,
        domain: "docs".into(),
        theme,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

#[test]
fn site_response_flattens_row_and_resolves_theme() {
    let response = SiteResponse::from(row(serde_json::json!({ "primaryColor": "#059669", "layout": "grid" })));
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["domain"], "docs");
    assert_eq!(json["theme"]["layout"], "grid");
    assert_eq!(json["resolved_theme"]["primaryColor"], "#059669");
    assert_eq!(json["resolved_theme"]["layout"], "modern");
}

#[tokio::test]
async fn domain_check_normalizes_malformed_input() {
    let response = app(test_app_state())
        .oneshot(Request::get("/api/domains/check?domain=%21%21").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["available"], false);
    assert_eq!(json["domain"], "");
}

#[tokio::test]
async fn domain_check_requires_domain_param() {
    let response = app(test_app_state())
        .oneshot(Request::get("/api/domains/check").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::services::session;
    use crate::state::test_helpers::{insert_user, integration_pool};

    async fn authed_router() -> (axum::Router, String) {
        let mut state = test_app_state();
        state.pool = integration_pool().await;
        let user_id = insert_user(&state.pool).await;
        let token = session::create_session(&state.pool, user_id, 1).await.expect("session");
        (app(state), format!("session_token={token}"))
    }

    async fn create(router: &axum::Router, cookie: &str, name: &str) -> serde_json::Value {
        let response = router
            .clone()
            .oneshot(
                Request::post("/api/sites")
                    .header("cookie", cookie)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::json!({ "name": name }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn same_name_twice_gets_distinct_domains() {
        let (router, cookie) = authed_router().await;
        let name = format!("Cool FAQ {}", Uuid::new_v4().simple());

        let first = create(&router, &cookie, &name).await;
        let second = create(&router, &cookie, &name).await;
        assert_ne!(first["domain"], second["domain"]);
        assert_eq!(second["domain"], format!("{}1", first["domain"].as_str().unwrap()));
    }
}
