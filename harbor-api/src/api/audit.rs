//! Audit API handler
//!
//! GET /api/audit/:slug serves the freshness-gated audit bundle. The
//! endpoint never reports provider failures as errors: a run where all
//! providers fail still returns 200 with zero scores.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::audit::load_or_run;
use crate::db::brands;
use crate::error::{ApiError, ApiResult};
use crate::models::{AuditField, ModelAudit, ModelFinding};
use crate::AppState;

/// GET /api/audit/:slug response
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub slug: String,
    pub brand_name: String,
    /// true when the stored bundle was served without provider calls
    pub cached: bool,
    pub models: BTreeMap<String, ModelAudit>,
    pub consensus_issues: Vec<AuditField>,
    pub worst_issues: Vec<ModelFinding>,
    pub has_issues: bool,
    pub overall_accuracy: u8,
    pub email_hook: String,
    pub checked_at: DateTime<Utc>,
}

/// GET /api/audit/:slug
pub async fn get_audit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<AuditResponse>> {
    let row = brands::get_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown brand: {}", slug)))?;

    let outcome = load_or_run(&state.db, &state.providers, &state.event_bus, &row).await;
    let bundle = outcome.bundle;

    Ok(Json(AuditResponse {
        slug: row.slug,
        brand_name: row.brand_name,
        cached: outcome.cached,
        models: bundle.models,
        consensus_issues: bundle.consensus_issues,
        worst_issues: bundle.worst_issues,
        has_issues: bundle.has_issues,
        overall_accuracy: bundle.overall_accuracy,
        email_hook: bundle.email_hook,
        checked_at: bundle.checked_at,
    }))
}

/// Build audit routes
pub fn audit_routes() -> Router<AppState> {
    Router::new().route("/api/audit/:slug", get(get_audit))
}
