//! Website crawler collaborator
//!
//! The crawler itself is an external service; harbor-api only submits a
//! domain and consumes the structured result. The trait seam lets tests
//! inject a stub and keeps the analytics flow independent of the crawler
//! deployment.

use crate::models::{CrawlResult, Plan};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const CRAWL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Crawler endpoint not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Crawler error {0}: {1}")]
    Api(u16, String),
}

/// External website crawler
#[async_trait]
pub trait WebsiteCrawler: Send + Sync {
    /// Crawl `domain` under the page budget implied by `plan`
    async fn crawl(&self, domain: &str, plan: Plan) -> Result<CrawlResult, CrawlError>;
}

#[derive(Debug, Serialize)]
struct CrawlRequest<'a> {
    domain: &'a str,
    plan: Plan,
}

/// HTTP client for a hosted crawler service
pub struct HttpCrawler {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpCrawler {
    /// `endpoint` is the crawler service URL; None means unconfigured
    /// and every crawl fails with `NotConfigured`.
    pub fn new(endpoint: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(CRAWL_TIMEOUT)
            .build()
            .expect("HTTP client construction only fails on TLS backend misconfiguration");
        Self { http, endpoint }
    }
}

#[async_trait]
impl WebsiteCrawler for HttpCrawler {
    async fn crawl(&self, domain: &str, plan: Plan) -> Result<CrawlResult, CrawlError> {
        let endpoint = self.endpoint.as_deref().ok_or(CrawlError::NotConfigured)?;

        let response = self
            .http
            .post(endpoint)
            .json(&CrawlRequest { domain, plan })
            .send()
            .await
            .map_err(|e| CrawlError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrawlError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| CrawlError::Network(e.to_string()))
    }
}
