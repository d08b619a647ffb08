//! FAQ item routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::faq::{self, FaqItem, FaqItemUpdate, NewFaqItem};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateItemBody {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateItemBody {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Deserialize)]
pub struct ReorderBody {
    pub ids: Vec<Uuid>,
}

/// `GET /api/sites/{id}/items`
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
) -> Result<Json<Vec<FaqItem>>, ApiError> {
    Ok(Json(faq::list_items(&state.pool, auth.user.id, site_id).await?))
}

/// `POST /api/sites/{id}/items`
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
    Json(body): Json<CreateItemBody>,
) -> Result<(StatusCode, Json<FaqItem>), ApiError> {
    let input = NewFaqItem {
        question: body.question,
        answer: body.answer,
        category: body.category,
        is_published: body.is_published,
    };
    let item = faq::create_item(&state.pool, auth.user.id, site_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PATCH /api/sites/{id}/items/{item_id}`
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((site_id, item_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<FaqItem>, ApiError> {
    let update = FaqItemUpdate {
        question: body.question,
        answer: body.answer,
        category: body.category,
        is_published: body.is_published,
    };
    Ok(Json(faq::update_item(&state.pool, auth.user.id, site_id, item_id, update).await?))
}

/// `POST /api/sites/{id}/items/{item_id}/publish`: flip visibility.
pub async fn toggle_published(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((site_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<FaqItem>, ApiError> {
    Ok(Json(faq::toggle_published(&state.pool, auth.user.id, site_id, item_id).await?))
}

/// `PUT /api/sites/{id}/items/order`
pub async fn reorder_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
    Json(body): Json<ReorderBody>,
) -> Result<Json<Vec<FaqItem>>, ApiError> {
    Ok(Json(faq::reorder_items(&state.pool, auth.user.id, site_id, &body.ids).await?))
}

/// `DELETE /api/sites/{id}/items/{item_id}`
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((site_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    faq::delete_item(&state.pool, auth.user.id, site_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
