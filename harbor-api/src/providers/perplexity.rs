//! Perplexity chat-completions adapter
//!
//! Perplexity exposes an OpenAI-shaped REST endpoint, so this adapter
//! reuses the request/response types from the OpenAI module against a
//! different base URL and model name.

use super::openai::{extract_content, ChatMessage, ChatRequest, ChatResponse};
use super::{ModelProvider, ProviderError, ProviderId};
use async_trait::async_trait;

const API_URL: &str = "https://api.perplexity.ai/chat/completions";
const MODEL: &str = "sonar";

pub struct PerplexityProvider {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl PerplexityProvider {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl ModelProvider for PerplexityProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Perplexity
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey(ProviderId::Perplexity))?;

        let request = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(API_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        extract_content(parsed)
    }
}
