//! ArtFestLive backend
//!
//! REST backend for a live art festival: unit registration, per-event scoring, a public
//! scoreboard, gallery and venue announcements. Records persist in SQLite; unit names are
//! searchable through a Tantivy index.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod scoring;
mod search;
mod service;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use search::SearchIndex;
use service::Festival;
use store::SqliteStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub festival: Festival,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ArtFestLive backend");
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        orphan_policy = config.orphan_policy.as_str(),
        tie_break = config.tie_break.as_str(),
        max_tx_retries = config.max_tx_retries,
        "Scoring configuration"
    );

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (ARTFEST_API_PSK). Admin routes are open!");
    }

    let pool = store::init_database(&config.db_path).await?;
    let store = Arc::new(SqliteStore::new(pool, config.max_tx_retries));
    let festival = Festival::new(store, config.orphan_policy, config.tie_break);

    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    tracing::info!("Building search index...");
    let units = festival.list_units().await?;
    search.rebuild(&units).await?;

    let state = AppState {
        festival,
        search,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    // Public and unit self-service routes
    let public_routes = Router::new()
        .route("/scoreboard", get(api::get_scoreboard))
        .route("/events", get(api::list_events))
        .route("/gallery", get(api::list_gallery))
        .route("/venue", get(api::list_venue))
        .route("/venue/current", get(api::get_current_venue))
        .route("/login", post(api::login))
        .route("/dashboard/{unit_id}", get(api::get_dashboard));

    let admin_routes = Router::new()
        .route("/overview", get(api::get_overview))
        // Events
        .route("/events", post(api::create_event))
        .route("/events/{id}", delete(api::delete_event))
        // Units
        .route("/units", get(api::list_units).post(api::create_unit))
        .route(
            "/units/{id}",
            get(api::get_unit)
                .put(api::update_unit)
                .delete(api::delete_unit),
        )
        .route("/units/{id}/scores", put(api::update_score))
        // Gallery
        .route("/gallery", post(api::create_gallery_image))
        .route("/gallery/{id}", delete(api::delete_gallery_image))
        // Venue
        .route("/venue", post(api::create_venue))
        .route("/venue/{id}", put(api::update_venue).delete(api::delete_venue))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.nest("/admin", admin_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
