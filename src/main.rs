//! Biomap Backend
//!
//! A REST backend for a biodiversity-observation dashboard: filtered
//! occurrence queries, hexagon-binned vector tiles and the matching
//! non-tile views (counts, pages, histograms) over SQLite persistence.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod filters;
mod models;
mod tiles;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Biomap Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!(
            "No API PSK configured (BIOMAP_API_PSK); seen/unseen status filters will be ignored"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the viewer-context layer
    let psk = state.config.api_psk.clone();

    // Occurrence and catalog endpoints
    let api_routes = Router::new()
        .route("/occurrences", get(api::occurrences_page))
        .route("/occurrences/count", get(api::occurrences_count))
        .route(
            "/occurrences/monthly-histogram",
            get(api::occurrences_monthly_histogram),
        )
        .route("/species", get(api::species_list))
        .route("/datasets", get(api::datasets_list))
        .route("/areas", get(api::areas_list));

    // Map tile endpoints
    let tile_routes = Router::new()
        .route("/tiles/{zoom}/{x}/{y}", get(api::hexagon_grid_tile))
        .route("/tiles/min-max", get(api::hexagon_grid_min_max));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(tile_routes)
        .merge(health_routes)
        .layer(middleware::from_fn(move |req, next| {
            auth::viewer_context_layer(psk.clone(), req, next)
        }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
