//! LLM provider adapters
//!
//! Thin chat-completion clients for the three audited model providers.
//! Each adapter renders no prompt of its own: it receives the final
//! prompt text, performs one HTTP call, and returns the raw reply text.
//! No retries and no backoff — a failed call surfaces as an error and
//! the audit pipeline degrades that provider to a zero-value result.

mod anthropic;
mod openai;
mod perplexity;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use harbor_common::db::settings;
use harbor_common::Result as CommonResult;

/// Transport timeout applied at client construction. There is no
/// per-call timeout wrapper: a slow provider delays the aggregate
/// response until this transport limit fires.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("Harbor/", env!("CARGO_PKG_VERSION"));

/// Provider identifiers in fixed audit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Perplexity,
}

impl ProviderId {
    /// The fixed provider order used for aggregation and encounter-order
    /// iteration. Never completion order.
    pub const ALL: [ProviderId; 3] = [ProviderId::Anthropic, ProviderId::OpenAi, ProviderId::Perplexity];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::OpenAi => "openai",
            ProviderId::Perplexity => "perplexity",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider adapter errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No API key configured for {0}")]
    MissingApiKey(ProviderId),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Empty reply from provider")]
    EmptyReply,
}

/// One external chat-completion endpoint
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Send the rendered prompt and return the raw reply text
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// The fixed set of providers consulted by every audit run
///
/// Holds the adapters in audit order. `settle_all` fans the prompt out
/// to every provider concurrently and waits for all of them to settle,
/// collecting each outcome independently — one provider's failure never
/// cancels its siblings.
pub struct ProviderSet {
    providers: Vec<Arc<dyn ModelProvider>>,
}

impl ProviderSet {
    pub fn new(providers: Vec<Arc<dyn ModelProvider>>) -> Self {
        Self { providers }
    }

    /// Build the production set from settings-table keys (env fallback)
    ///
    /// A missing key does not remove the provider: its adapter is still
    /// constructed and fails fast with MissingApiKey on first call, so
    /// the audit degrades instead of changing shape.
    pub async fn from_settings(db: &SqlitePool) -> CommonResult<Self> {
        let http = shared_client();

        let anthropic_key = settings::get_provider_api_key(db, "anthropic").await?;
        let openai_key = settings::get_provider_api_key(db, "openai").await?;
        let perplexity_key = settings::get_provider_api_key(db, "perplexity").await?;

        Ok(Self::new(vec![
            Arc::new(AnthropicProvider::new(http.clone(), anthropic_key)),
            Arc::new(OpenAiProvider::new(http.clone(), openai_key)),
            Arc::new(PerplexityProvider::new(http, perplexity_key)),
        ]))
    }

    /// Provider ids in fixed order
    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ModelProvider>> {
        self.providers.iter()
    }

    /// Fan out the prompt to all providers and wait for every call to
    /// settle. Results come back in fixed list order regardless of which
    /// provider finished first.
    pub async fn settle_all(&self, prompt: &str) -> Vec<(ProviderId, Result<String, ProviderError>)> {
        let calls = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let prompt = prompt.to_string();
            async move {
                let id = provider.id();
                let reply = provider.complete(&prompt).await;
                (id, reply)
            }
        });

        futures::future::join_all(calls).await
    }
}

/// Shared HTTP client for all provider adapters
fn shared_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("HTTP client construction only fails on TLS backend misconfiguration")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedProvider {
        id: ProviderId,
        reply: Result<String, ()>,
        delay_ms: u64,
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(ProviderError::Network("connection refused".to_string())),
            }
        }
    }

    fn scripted(id: ProviderId, reply: Result<String, ()>, delay_ms: u64) -> Arc<dyn ModelProvider> {
        Arc::new(ScriptedProvider { id, reply, delay_ms })
    }

    #[tokio::test]
    async fn test_settle_all_preserves_list_order_despite_completion_order() {
        // Anthropic is slowest; results must still come back first in list order
        let set = ProviderSet::new(vec![
            scripted(ProviderId::Anthropic, Ok("a".to_string()), 50),
            scripted(ProviderId::OpenAi, Ok("b".to_string()), 5),
            scripted(ProviderId::Perplexity, Ok("c".to_string()), 1),
        ]);

        let results = set.settle_all("prompt").await;
        let ids: Vec<ProviderId> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ProviderId::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_settle_all_failure_does_not_cancel_siblings() {
        let set = ProviderSet::new(vec![
            scripted(ProviderId::Anthropic, Err(()), 1),
            scripted(ProviderId::OpenAi, Ok("fine".to_string()), 20),
            scripted(ProviderId::Perplexity, Ok("also fine".to_string()), 5),
        ]);

        let results = set.settle_all("prompt").await;
        assert!(results[0].1.is_err());
        assert_eq!(results[1].1.as_ref().unwrap(), "fine");
        assert_eq!(results[2].1.as_ref().unwrap(), "also fine");
    }

    #[test]
    fn test_provider_id_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProviderId::OpenAi).unwrap(),
            "\"openai\""
        );
        assert_eq!(ProviderId::Anthropic.as_str(), "anthropic");
    }
}
