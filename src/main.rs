mod config;
mod db;
mod routes;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "faqsite=info,tower_http=info";

#[tokio::main]
async fn main() {
    // A missing .env is normal outside local development.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");

    let store = services::storage::store_from_config(&config);
    match &config.storage {
        config::StorageBackend::Local { root } => {
            tracing::info!(root = %root.display(), "profile images stored on local disk");
        }
        config::StorageBackend::Hosted { url, .. } => {
            tracing::info!(%url, "profile images stored in hosted storage");
        }
    }

    let port = config.port;
    let state = state::AppState::new(pool, config, store);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "faqsite listening");
    axum::serve(listener, app).await.expect("server failed");
}
