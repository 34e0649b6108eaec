//! Event types for the Harbor event system
//!
//! Provides shared event definitions and the EventBus used by all Harbor
//! services. Events are broadcast via EventBus and serialized for SSE
//! transmission to connected dashboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Harbor event types
///
/// All services emit through this central enum for type safety and
/// exhaustive matching at SSE filter sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HarborEvent {
    /// An audit pipeline run began for a brand (cache was stale or absent)
    AuditStarted {
        /// Brand slug being audited
        slug: String,
        /// When the run began
        timestamp: DateTime<Utc>,
    },

    /// One provider finished (successfully or not) during an audit run
    ///
    /// `outcome` is one of "completed", "unavailable", "unparseable" —
    /// a failed provider still settles and still emits this event.
    ProviderSettled {
        /// Brand slug being audited
        slug: String,
        /// Provider identifier ("anthropic", "openai", "perplexity")
        provider: String,
        /// Settlement outcome label
        outcome: String,
        /// Self-reported accuracy score (0 when the provider failed)
        accuracy_score: u8,
        /// Number of findings the provider reported
        finding_count: usize,
        /// When the provider settled
        timestamp: DateTime<Utc>,
    },

    /// Audit pipeline finished and the bundle was (re)computed
    AuditCompleted {
        /// Brand slug audited
        slug: String,
        /// Number of consensus issues found
        consensus_count: usize,
        /// Rounded mean of the per-provider accuracy scores
        overall_accuracy: u8,
        /// When the bundle was computed
        timestamp: DateTime<Utc>,
    },

    /// A new brand row was created through the submission endpoint
    BrandSubmitted {
        /// Slug assigned to the new brand
        slug: String,
        /// Normalized domain
        domain: String,
        /// When the brand was created
        timestamp: DateTime<Utc>,
    },

    /// The website-crawl cache for a brand was refreshed
    CrawlRefreshed {
        /// Brand slug crawled
        slug: String,
        /// Pages the crawler analyzed
        pages_analyzed: u32,
        /// When the crawl completed
        timestamp: DateTime<Utc>,
    },
}

impl HarborEvent {
    /// Event type name used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            HarborEvent::AuditStarted { .. } => "AuditStarted",
            HarborEvent::ProviderSettled { .. } => "ProviderSettled",
            HarborEvent::AuditCompleted { .. } => "AuditCompleted",
            HarborEvent::BrandSubmitted { .. } => "BrandSubmitted",
            HarborEvent::CrawlRefreshed { .. } => "CrawlRefreshed",
        }
    }
}

/// Broadcast bus carrying HarborEvents to SSE subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HarborEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// Old events are dropped once the channel is full; slow SSE clients
    /// observe a lagged receiver, not service backpressure.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<HarborEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Emission is lossy: with no subscribers the event is dropped and
    /// logged at debug level. Event emission never fails a request.
    pub fn emit(&self, event: HarborEvent) {
        match self.tx.send(event) {
            Ok(receiver_count) => {
                tracing::trace!("Event broadcast to {} receivers", receiver_count);
            }
            Err(_) => {
                tracing::debug!("No subscribers for event, dropped");
            }
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
