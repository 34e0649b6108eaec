//! Prompt execution streaming
//!
//! GET /api/prompts/run/:slug runs the audit prompt against every
//! provider concurrently and pushes one SSE event per provider as each
//! call settles. Unlike the audit pipeline, events follow completion
//! order, not list order; a slow provider delays only its own event.
//!
//! Client disconnect simply drops the stream. In-flight provider calls
//! are not aborted; their results are discarded when the channel closes.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::audit::{classify_reply, prompt, ProviderOutcome};
use crate::db::brands;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// One per-provider SSE payload
#[derive(Debug, Clone, Serialize)]
pub struct ProviderResult {
    pub provider: String,
    /// "completed", "unavailable", or "unparseable"
    pub outcome: String,
    pub accuracy_score: u8,
    pub finding_count: usize,
    pub elapsed_ms: u64,
}

/// Spawn one task per provider and return a channel yielding results in
/// completion order
pub fn stream_provider_results(
    state: &AppState,
    prompt_text: String,
) -> mpsc::Receiver<ProviderResult> {
    let (tx, rx) = mpsc::channel(state.providers.len().max(1));

    for provider in state.providers.iter() {
        let provider = Arc::clone(provider);
        let prompt_text = prompt_text.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let started = std::time::Instant::now();
            let reply = provider.complete(&prompt_text).await;
            let outcome = classify_reply(reply);

            let (accuracy_score, finding_count) = match &outcome {
                ProviderOutcome::Completed(audit) => {
                    (audit.accuracy_score, audit.findings.len())
                }
                _ => (0, 0),
            };

            let result = ProviderResult {
                provider: provider.id().as_str().to_string(),
                outcome: outcome.status_label().to_string(),
                accuracy_score,
                finding_count,
                elapsed_ms: started.elapsed().as_millis() as u64,
            };

            // Receiver may be gone (client disconnected); the result is
            // simply dropped
            let _ = tx.send(result).await;
        });
    }

    rx
}

/// GET /api/prompts/run/:slug
pub async fn run_prompt_stream(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let row = brands::get_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown brand: {}", slug)))?;

    info!(slug = %row.slug, "Prompt run stream started");

    let prompt_text = prompt::render(&row.profile());
    let total = state.providers.len();
    let mut rx = stream_provider_results(&state, prompt_text);

    let stream = async_stream::stream! {
        let mut settled = 0usize;

        while settled < total {
            match rx.recv().await {
                Some(result) => {
                    settled += 1;
                    debug!(provider = %result.provider, outcome = %result.outcome, "Provider settled");

                    match serde_json::to_string(&result) {
                        Ok(json) => yield Ok(Event::default().event("provider_result").data(json)),
                        Err(e) => debug!("Failed to serialize provider result: {}", e),
                    }
                }
                // All senders dropped without settling: end the stream
                None => break,
            }
        }

        yield Ok(Event::default()
            .event("done")
            .data(format!("{{\"providers\":{}}}", settled)));
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    ))
}

/// Build prompt execution routes
pub fn prompt_routes() -> Router<AppState> {
    Router::new().route("/api/prompts/run/:slug", get(run_prompt_stream))
}
