//! Profile routes: display fields and avatar upload.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::account::{self, Profile, ProfileUpdate};
use crate::services::storage::{self, ImageUpload};
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";
/// Headroom for multipart boundaries and headers on top of the image limit.
pub(crate) const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Deserialize)]
pub struct ProfileBody {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// `GET /api/profile`
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Profile>, ApiError> {
    let profile = account::get_profile(&state.pool, auth.user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile not found"))?;
    Ok(Json(profile))
}

/// `PATCH /api/profile`: upsert display fields.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileBody>,
) -> Result<Json<Profile>, ApiError> {
    let update = ProfileUpdate { full_name: body.full_name, avatar_url: body.avatar_url };
    Ok(Json(account::upsert_profile(&state.pool, auth.user.id, update).await?))
}

fn multipart_error(err: &axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::new(err.status(), err.body_text())
}

/// `POST /api/profile/avatar`: multipart upload of field `file`.
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(&e))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        upload = Some(ImageUpload { filename, content_type, bytes: bytes.to_vec() });
        break;
    }
    let upload = upload.ok_or_else(|| ApiError::bad_request("missing multipart field \"file\""))?;

    let profile = storage::upload_profile_image(
        &state.pool,
        state.store.as_ref(),
        &state.config.profile_image_bucket,
        state.config.max_image_bytes,
        auth.user.id,
        upload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `DELETE /api/profile/avatar`
pub async fn delete_avatar(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Profile>, ApiError> {
    let profile =
        storage::delete_profile_image(&state.pool, state.store.as_ref(), &state.config.profile_image_bucket, auth.user.id)
            .await?;
    Ok(Json(profile))
}
