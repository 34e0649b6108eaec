//! Website analytics API handler
//!
//! GET /api/analytics/:slug wraps the external crawler collaborator
//! with a 24-hour cache, mirroring the audit freshness gate on a
//! shorter horizon.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::brands;
use crate::error::{ApiError, ApiResult};
use crate::models::{Plan, StoredCrawl};
use crate::AppState;
use harbor_common::events::HarborEvent;
use harbor_common::time;

/// Crawl caches are served unchanged for exactly this long
pub const CRAWL_TTL_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub plan: Option<Plan>,
}

/// GET /api/analytics/:slug response
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub slug: String,
    /// true when the stored crawl was served without invoking the crawler
    pub cached: bool,
    pub issues: Vec<String>,
    pub schemas_found: Vec<String>,
    pub readability_score: f64,
    pub schema_coverage: f64,
    pub pages_analyzed: u32,
    pub crawled_at: DateTime<Utc>,
}

impl AnalyticsResponse {
    fn from_stored(slug: String, cached: bool, stored: StoredCrawl) -> Self {
        Self {
            slug,
            cached,
            issues: stored.result.issues,
            schemas_found: stored.result.schemas_found,
            readability_score: stored.result.readability_score,
            schema_coverage: stored.result.schema_coverage,
            pages_analyzed: stored.result.pages_analyzed,
            crawled_at: stored.crawled_at,
        }
    }
}

/// GET /api/analytics/:slug
pub async fn get_analytics(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsResponse>> {
    let row = brands::get_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown brand: {}", slug)))?;

    if let Some(stored) = row.stored_crawl() {
        if time::is_fresh(stored.crawled_at, Duration::hours(CRAWL_TTL_HOURS), time::now()) {
            return Ok(Json(AnalyticsResponse::from_stored(row.slug, true, stored)));
        }
    }

    let plan = query.plan.unwrap_or_default();
    let result = state
        .crawler
        .crawl(&row.domain, plan)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let stored = StoredCrawl {
        result,
        crawled_at: time::now(),
    };

    // Cache write is best-effort; the crawl result is served regardless
    if let Err(e) = brands::update_crawl_data(&state.db, &row.slug, &stored).await {
        warn!(slug = %row.slug, "Failed to persist crawl cache: {}", e);
    }

    state.event_bus.emit(HarborEvent::CrawlRefreshed {
        slug: row.slug.clone(),
        pages_analyzed: stored.result.pages_analyzed,
        timestamp: stored.crawled_at,
    });

    Ok(Json(AnalyticsResponse::from_stored(row.slug, false, stored)))
}

/// Build analytics routes
pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/api/analytics/:slug", get(get_analytics))
}
