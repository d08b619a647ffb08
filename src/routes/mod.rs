//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the authenticated dashboard API under `/api`, the
//! public FAQ pages under `/sites/{domain}`, and (for the local storage
//! backend) uploaded profile images under `/storage`.

pub mod auth;
pub mod categories;
pub mod error;
pub mod items;
pub mod profile;
pub mod public;
pub mod sites;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::StorageBackend;
use crate::state::AppState;

/// Request body cap for avatar uploads: the image limit plus multipart framing.
fn avatar_body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes.saturating_add(profile::MULTIPART_OVERHEAD)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    let avatar_limit = DefaultBodyLimit::max(avatar_body_limit(state.config.max_image_bytes));

    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/signin", post(auth::signin))
        .route("/api/auth/signout", post(auth::signout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/profile", get(profile::get_profile).patch(profile::update_profile))
        .route(
            "/api/profile/avatar",
            post(profile::upload_avatar).delete(profile::delete_avatar).layer(avatar_limit),
        )
        .route("/api/sites", get(sites::list_sites).post(sites::create_site))
        .route(
            "/api/sites/{id}",
            get(sites::get_site).patch(sites::update_site).delete(sites::delete_site),
        )
        .route("/api/sites/{id}/theme", put(sites::update_theme).delete(sites::reset_theme))
        .route("/api/sites/{id}/items", get(items::list_items).post(items::create_item))
        .route("/api/sites/{id}/items/order", put(items::reorder_items))
        .route(
            "/api/sites/{id}/items/{item_id}",
            patch(items::update_item).delete(items::delete_item),
        )
        .route("/api/sites/{id}/items/{item_id}/publish", post(items::toggle_published))
        .route(
            "/api/sites/{id}/categories",
            get(categories::list_categories).post(categories::add_category),
        )
        .route(
            "/api/sites/{id}/categories/{name}",
            patch(categories::rename_category).delete(categories::delete_category),
        )
        .route("/api/domains/check", get(sites::check_domain))
        .route("/api/domains/suggest", get(sites::suggest_domain))
        .route("/api/themes/presets", get(sites::theme_presets))
        .route("/api/public/sites/{domain}", get(public::site_json))
        .route("/sites/{domain}", get(public::site_page))
        .route("/healthz", get(healthz))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = api_routes(&state);
    if let StorageBackend::Local { root } = &state.config.storage {
        router = router.nest_service("/storage", ServeDir::new(root));
    }

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
