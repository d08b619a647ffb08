//! Unauthenticated public site routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use tracing::error;

use crate::routes::error::ApiError;
use crate::services::public_site::{self, PublicSite};
use crate::state::AppState;

fn lookup_key(domain: &str) -> String {
    domain.trim().to_ascii_lowercase()
}

/// `GET /api/public/sites/{domain}`: published data as JSON.
pub async fn site_json(State(state): State<AppState>, Path(domain): Path<String>) -> Result<Json<PublicSite>, ApiError> {
    let site = public_site::load_public_site(&state.pool, &lookup_key(&domain))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("site not found: {domain}")))?;
    Ok(Json(site))
}

/// `GET /sites/{domain}`: rendered FAQ page.
pub async fn site_page(State(state): State<AppState>, Path(domain): Path<String>) -> Response {
    match public_site::load_public_site(&state.pool, &lookup_key(&domain)).await {
        Ok(Some(site)) => Html(public_site::render_site_html(&site)).into_response(),
        Ok(None) => {
            let home = format!("{}/", state.config.public_base_url);
            (StatusCode::NOT_FOUND, Html(public_site::render_not_found_html(&domain, &home))).into_response()
        }
        Err(e) => {
            error!(error = %e, %domain, "public site load failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Something went wrong</h1>")).into_response()
        }
    }
}
