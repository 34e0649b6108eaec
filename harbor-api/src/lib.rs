//! harbor-api library interface
//!
//! Exposes the router, state, and pipeline modules for integration
//! testing.

pub mod api;
pub mod audit;
pub mod db;
pub mod error;
pub mod models;
pub mod providers;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use harbor_common::events::EventBus;

use crate::providers::ProviderSet;
use crate::services::crawler::WebsiteCrawler;
use crate::services::rate_limiter::SubmissionLimiter;
use crate::services::site_scraper::SiteScraper;

/// Application state shared across handlers
///
/// Every collaborator the handlers depend on is injected here; tests
/// swap providers, crawler, and limiter for stubs.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// The fixed provider set consulted by audits
    pub providers: Arc<ProviderSet>,
    /// External website crawler collaborator
    pub crawler: Arc<dyn WebsiteCrawler>,
    /// Per-IP submission limiter
    pub limiter: Arc<SubmissionLimiter>,
    /// Homepage metadata scraper
    pub scraper: Arc<SiteScraper>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        providers: Arc<ProviderSet>,
        crawler: Arc<dyn WebsiteCrawler>,
        limiter: Arc<SubmissionLimiter>,
    ) -> Self {
        Self {
            db,
            event_bus,
            providers,
            crawler,
            limiter,
            scraper: Arc::new(SiteScraper::new()),
            startup_time: harbor_common::time::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::{cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .merge(api::audit_routes())
        .merge(api::brand_routes())
        .merge(api::analytics_routes())
        .merge(api::prompt_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
