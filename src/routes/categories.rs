//! Category routes. Names travel in the path, percent-encoded.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::category;
use crate::state::AppState;

#[derive(Deserialize, Serialize)]
pub struct CategoryBody {
    pub name: String,
}

#[derive(Serialize)]
pub struct RenamedCategory {
    pub name: String,
    pub items_updated: u64,
}

/// `GET /api/sites/{id}/categories`
pub async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(category::list_categories(&state.pool, auth.user.id, site_id).await?))
}

/// `POST /api/sites/{id}/categories`
pub async fn add_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<CategoryBody>), ApiError> {
    let name = category::add_category(&state.pool, auth.user.id, site_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(CategoryBody { name })))
}

/// `PATCH /api/sites/{id}/categories/{name}`: rename, re-filing items.
pub async fn rename_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((site_id, name)): Path<(Uuid, String)>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<RenamedCategory>, ApiError> {
    let items_updated = category::rename_category(&state.pool, auth.user.id, site_id, &name, &body.name).await?;
    Ok(Json(RenamedCategory { name: body.name.trim().to_owned(), items_updated }))
}

/// `DELETE /api/sites/{id}/categories/{name}`
pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((site_id, name)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    category::delete_category(&state.pool, auth.user.id, site_id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}
