use super::*;
use http_body_util::BodyExt;
use uuid::Uuid;

use crate::services::theme::ThemeError;

#[test]
fn site_errors_map_to_statuses() {
    assert_eq!(ApiError::from(SiteError::NotFound(Uuid::nil())).into_response().status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::from(SiteError::Forbidden(Uuid::nil())).into_response().status(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::from(SiteError::InvalidName).into_response().status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(SiteError::Theme(ThemeError::NotAnObject)).into_response().status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(SiteError::DomainTaken("x".into())).into_response().status(), StatusCode::CONFLICT);
}

#[test]
fn nested_site_errors_keep_their_status() {
    let err = ApiError::from(FaqError::Site(SiteError::Forbidden(Uuid::nil())));
    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    let err = ApiError::from(CategoryError::Site(SiteError::NotFound(Uuid::nil())));
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[test]
fn item_and_category_errors_map_to_statuses() {
    assert_eq!(ApiError::from(FaqError::InvalidOrder).into_response().status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(FaqError::NotFound(Uuid::nil())).into_response().status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::from(CategoryError::Duplicate("a".into())).into_response().status(), StatusCode::CONFLICT);
    assert_eq!(ApiError::from(CategoryError::EmptyName).into_response().status(), StatusCode::BAD_REQUEST);
}

#[test]
fn account_errors_map_to_statuses() {
    assert_eq!(ApiError::from(AccountError::InvalidCredentials).into_response().status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ApiError::from(AccountError::EmailTaken).into_response().status(), StatusCode::CONFLICT);
    assert_eq!(ApiError::from(AccountError::WeakPassword).into_response().status(), StatusCode::BAD_REQUEST);
}

#[test]
fn storage_errors_map_to_statuses() {
    assert_eq!(ApiError::from(StorageError::TooLarge { limit: 1 }).into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(ApiError::from(StorageError::NotAnImage("text/plain".into())).into_response().status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::from(StorageError::ForeignObject("k".into())).into_response().status(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::from(StorageError::Backend("503".into())).into_response().status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn internal_errors_hide_details() {
    let response = ApiError::from(sqlx::Error::RowNotFound).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "internal server error");
}

#[tokio::test]
async fn renders_json_envelope() {
    let response = ApiError::from(SiteError::DomainTaken("cool-faq".into())).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "domain already in use: cool-faq");
}
