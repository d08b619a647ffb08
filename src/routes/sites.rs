//! Site routes: CRUD, themes, and domain helpers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::error::ApiError;
use crate::services::domain;
use crate::services::site::{self, NewSite, SiteRow, SiteUpdate};
use crate::services::theme::{self, SiteTheme, ThemePresets};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SiteResponse {
    #[serde(flatten)]
    pub site: SiteRow,
    /// Stored theme overlaid on the defaults, as the public page renders it.
    pub resolved_theme: SiteTheme,
}

impl From<SiteRow> for SiteResponse {
    fn from(site: SiteRow) -> Self {
        let resolved_theme = site.resolved_theme();
        Self { site, resolved_theme }
    }
}

#[derive(Deserialize)]
pub struct CreateSiteBody {
    pub name: String,
    pub description: Option<String>,
    pub domain: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateSiteBody {
    pub name: Option<String>,
    pub description: Option<String>,
    pub domain: Option<String>,
}

/// `GET /api/sites`: caller's sites, newest first.
pub async fn list_sites(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<SiteResponse>>, ApiError> {
    let rows = site::list_sites(&state.pool, auth.user.id).await?;
    Ok(Json(rows.into_iter().map(SiteResponse::from).collect()))
}

/// `POST /api/sites`
pub async fn create_site(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateSiteBody>,
) -> Result<(StatusCode, Json<SiteResponse>), ApiError> {
    let input = NewSite { name: body.name, description: body.description, domain: body.domain };
    let row = site::create_site(&state.pool, auth.user.id, input).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// `GET /api/sites/{id}`
pub async fn get_site(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
) -> Result<Json<SiteResponse>, ApiError> {
    Ok(Json(site::owned_site(&state.pool, site_id, auth.user.id).await?.into()))
}

/// `PATCH /api/sites/{id}`
pub async fn update_site(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
    Json(body): Json<UpdateSiteBody>,
) -> Result<Json<SiteResponse>, ApiError> {
    let update = SiteUpdate { name: body.name, description: body.description, domain: body.domain };
    Ok(Json(site::update_site(&state.pool, auth.user.id, site_id, update).await?.into()))
}

/// `DELETE /api/sites/{id}`
pub async fn delete_site(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    site::delete_site(&state.pool, auth.user.id, site_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// THEMES
// =============================================================================

/// `PUT /api/sites/{id}/theme`: merge a partial theme.
pub async fn update_theme(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<SiteResponse>, ApiError> {
    Ok(Json(site::update_theme(&state.pool, auth.user.id, site_id, &patch).await?.into()))
}

/// `DELETE /api/sites/{id}/theme`: back to defaults.
pub async fn reset_theme(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(site_id): Path<Uuid>,
) -> Result<Json<SiteResponse>, ApiError> {
    Ok(Json(site::reset_theme(&state.pool, auth.user.id, site_id).await?.into()))
}

/// `GET /api/themes/presets`
pub async fn theme_presets() -> Json<ThemePresets> {
    Json(theme::presets())
}

// =============================================================================
// DOMAINS
// =============================================================================

#[derive(Deserialize)]
pub struct DomainCheckQuery {
    pub domain: String,
    /// Site whose current domain counts as available (settings page).
    pub site_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DomainCheckResponse {
    pub domain: String,
    pub available: bool,
    /// Why the domain cannot be used as typed, if it is invalid.
    pub error: Option<String>,
}

/// `GET /api/domains/check?domain=..&site_id=..`
pub async fn check_domain(
    State(state): State<AppState>,
    Query(query): Query<DomainCheckQuery>,
) -> Result<Json<DomainCheckResponse>, ApiError> {
    let domain = match site::requested_domain(&query.domain) {
        Ok(domain) => domain,
        Err(e) => {
            return Ok(Json(DomainCheckResponse {
                domain: domain::normalize_domain(&query.domain),
                available: false,
                error: Some(e.to_string()),
            }));
        }
    };
    let available = domain::is_domain_available(&state.pool, &domain, query.site_id).await?;
    Ok(Json(DomainCheckResponse { domain, available, error: None }))
}

#[derive(Deserialize)]
pub struct DomainSuggestQuery {
    #[serde(default)]
    pub name: String,
}

/// `GET /api/domains/suggest?name=..`: an unused domain for a site name.
pub async fn suggest_domain(
    State(state): State<AppState>,
    Query(query): Query<DomainSuggestQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let domain = domain::generate_unique_domain(&state.pool, &query.name).await?;
    Ok(Json(serde_json::json!({ "domain": domain })))
}

#[cfg(test)]
#[path = "sites_test.rs"]
mod tests;
