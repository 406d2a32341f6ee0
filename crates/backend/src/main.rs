// =============================================================================
// Soy Risk Dashboard - Server Entry Point
// =============================================================================
// Table of Contents:
// 1. Imports
// 2. Application State
// 3. Main Entry Point
// 4. Router Setup
// =============================================================================

mod config;
mod dashboard;
mod error;
mod page;

use axum::{
    routing::{get, post},
    Router,
};
use soyrisk_geo::config::DefaultsConfig;
use soyrisk_geo::{DashboardConfig, DataContext};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

// -----------------------------------------------------------------------------
// 2. Application State
// -----------------------------------------------------------------------------

/// Shared application state. The tables are loaded once and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub defaults: Arc<DefaultsConfig>,
    pub data: Arc<DataContext>,
}

// -----------------------------------------------------------------------------
// 3. Main Entry Point
// -----------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Try current directory first, then crates/backend/
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_filename("crates/backend/.env");
    }

    let config = Config::from_env()?;

    // A missing or malformed input is fatal: nothing is served without data
    let dashboard = DashboardConfig::load(&config.dashboard_config)?;
    let data = DataContext::load(&dashboard)?;

    let state = AppState {
        defaults: Arc::new(dashboard.dashboard),
        data: Arc::new(data),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("🌱 Soy risk dashboard running on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

// -----------------------------------------------------------------------------
// 4. Router Setup
// -----------------------------------------------------------------------------

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Page
        .route("/", get(page::index))
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Dropdowns
        .route("/api/municipalities", get(dashboard::get_municipalities))
        .route("/api/companies", post(dashboard::post_companies))
        // Map and download
        .route("/api/figure", post(dashboard::post_figure))
        .route("/api/download", post(dashboard::post_download))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
