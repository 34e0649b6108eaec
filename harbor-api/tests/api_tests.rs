//! Integration tests for harbor-api endpoints
//!
//! Covers health, brand submission validation and rate limiting, and
//! the analytics crawl cache. Tests drive the real router through
//! tower's oneshot; providers and the crawler are scripted stubs.
//!
//! Submitted test domains use the reserved `.invalid` TLD so the
//! best-effort homepage scrape fails fast without touching the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use harbor_api::models::{CrawlResult, Plan};
use harbor_api::providers::{ModelProvider, ProviderError, ProviderId, ProviderSet};
use harbor_api::services::crawler::{CrawlError, WebsiteCrawler};
use harbor_api::services::rate_limiter::SubmissionLimiter;
use harbor_api::{build_router, AppState};
use harbor_common::events::EventBus;

/// Provider stub returning a fixed reply
struct ScriptedProvider {
    id: ProviderId,
    reply: Result<String, String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(ProviderError::Network(reason.clone())),
        }
    }
}

/// Crawler stub returning a fixed result and counting invocations
struct ScriptedCrawler {
    result: Result<CrawlResult, String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl WebsiteCrawler for ScriptedCrawler {
    async fn crawl(&self, _domain: &str, _plan: Plan) -> Result<CrawlResult, CrawlError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.result {
            Ok(result) => Ok(result.clone()),
            Err(reason) => Err(CrawlError::Network(reason.clone())),
        }
    }
}

fn clean_reply(accuracy: u8) -> Result<String, String> {
    Ok(json!({
        "ai_description": "a vendor",
        "findings": [],
        "accuracy_score": accuracy
    })
    .to_string())
}

fn scripted_providers(
    replies: [Result<String, String>; 3],
) -> (Arc<ProviderSet>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let [a, b, c] = replies;
    let ids = [ProviderId::Anthropic, ProviderId::OpenAi, ProviderId::Perplexity];
    let set = ProviderSet::new(
        ids.into_iter()
            .zip([a, b, c])
            .map(|(id, reply)| {
                Arc::new(ScriptedProvider {
                    id,
                    reply,
                    calls: Arc::clone(&calls),
                }) as Arc<dyn ModelProvider>
            })
            .collect(),
    );
    (Arc::new(set), calls)
}

fn sample_crawl() -> CrawlResult {
    CrawlResult {
        issues: vec!["missing FAQ schema".to_string()],
        schemas_found: vec!["Organization".to_string()],
        readability_score: 68.0,
        schema_coverage: 0.5,
        pages_analyzed: 10,
    }
}

struct TestApp {
    app: axum::Router,
    crawler_calls: Arc<AtomicUsize>,
    db: sqlx::SqlitePool,
}

async fn setup_app_with(
    crawler_result: Result<CrawlResult, String>,
) -> TestApp {
    let db = harbor_common::db::init_in_memory().await.unwrap();
    let (providers, _) = scripted_providers([clean_reply(90), clean_reply(90), clean_reply(90)]);

    let crawler_calls = Arc::new(AtomicUsize::new(0));
    let crawler = Arc::new(ScriptedCrawler {
        result: crawler_result,
        calls: Arc::clone(&crawler_calls),
    });

    let state = AppState::new(
        db.clone(),
        EventBus::new(64),
        providers,
        crawler,
        Arc::new(SubmissionLimiter::per_hour(5)),
    );

    TestApp {
        app: build_router(state),
        crawler_calls,
        db,
    }
}

async fn setup_app() -> TestApp {
    setup_app_with(Ok(sample_crawl())).await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, ip: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn seed_brand(db: &sqlx::SqlitePool, slug: &str, domain: &str) {
    harbor_api::db::brands::insert_brand(
        db,
        harbor_api::db::brands::NewBrand {
            slug: slug.to_string(),
            brand_name: "Acme".to_string(),
            domain: domain.to_string(),
            category: Some("saas".to_string()),
            feed_data: harbor_api::models::FeedData::default(),
            submitted_email: None,
        },
    )
    .await
    .unwrap();
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let t = setup_app().await;

    let response = t.app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "harbor-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Brand submission
// =============================================================================

#[tokio::test]
async fn test_add_brand_creates_row() {
    let t = setup_app().await;

    let request = post_json(
        "/api/brands/add",
        "203.0.113.1",
        json!({"domain": "acme.invalid", "email": "founder@acme.invalid"}),
    );
    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["existing"], false);
    assert_eq!(body["slug"], "acme");
}

#[tokio::test]
async fn test_add_brand_existing_domain_returns_existing() {
    let t = setup_app().await;
    seed_brand(&t.db, "acme", "acme.invalid").await;

    let request = post_json(
        "/api/brands/add",
        "203.0.113.1",
        json!({"domain": "acme.invalid", "email": "founder@acme.invalid"}),
    );
    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["existing"], true);
    assert_eq!(body["slug"], "acme");
}

#[tokio::test]
async fn test_add_brand_invalid_domain_rejected() {
    let t = setup_app().await;

    let request = post_json(
        "/api/brands/add",
        "203.0.113.1",
        json!({"domain": "not a domain", "email": "a@b.invalid"}),
    );
    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_add_brand_email_domain_mismatch_rejected() {
    let t = setup_app().await;

    let request = post_json(
        "/api/brands/add",
        "203.0.113.1",
        json!({"domain": "acme.invalid", "email": "someone@gmail.com"}),
    );
    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_brand_disposable_email_rejected() {
    let t = setup_app().await;

    let request = post_json(
        "/api/brands/add",
        "203.0.113.1",
        json!({"domain": "mailinator.com", "email": "anyone@mailinator.com"}),
    );
    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Disposable"));
}

#[tokio::test]
async fn test_sixth_submission_from_same_ip_rate_limited() {
    let t = setup_app().await;

    for i in 0..5 {
        let request = post_json(
            "/api/brands/add",
            "203.0.113.7",
            json!({
                "domain": format!("brand{}.invalid", i),
                "email": format!("founder@brand{}.invalid", i)
            }),
        );
        let response = t.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "submission {} should pass", i + 1);
    }

    let request = post_json(
        "/api/brands/add",
        "203.0.113.7",
        json!({"domain": "brand6.invalid", "email": "founder@brand6.invalid"}),
    );
    let response = t.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok()),
        Some("0")
    );
}

#[tokio::test]
async fn test_rate_limit_is_per_ip() {
    let t = setup_app().await;

    // Exhaust one IP
    for i in 0..5 {
        let request = post_json(
            "/api/brands/add",
            "203.0.113.8",
            json!({
                "domain": format!("peripa{}.invalid", i),
                "email": format!("founder@peripa{}.invalid", i)
            }),
        );
        t.app.clone().oneshot(request).await.unwrap();
    }

    // A different IP is unaffected
    let request = post_json(
        "/api/brands/add",
        "203.0.113.9",
        json!({"domain": "peripb.invalid", "email": "founder@peripb.invalid"}),
    );
    let response = t.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Analytics crawl cache
// =============================================================================

#[tokio::test]
async fn test_analytics_unknown_slug_404() {
    let t = setup_app().await;

    let response = t.app.oneshot(get("/api/analytics/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_analytics_crawls_then_serves_cache() {
    let t = setup_app().await;
    seed_brand(&t.db, "acme", "acme.invalid").await;

    // First request invokes the crawler
    let response = t.app.clone().oneshot(get("/api/analytics/acme")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["pages_analyzed"], 10);
    assert_eq!(t.crawler_calls.load(Ordering::SeqCst), 1);

    // Second request within 24h serves the cache, zero crawler calls
    let response = t.app.oneshot(get("/api/analytics/acme")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["cached"], true);
    assert_eq!(t.crawler_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_analytics_crawler_failure_is_bad_gateway() {
    let t = setup_app_with(Err("crawler down".to_string())).await;
    seed_brand(&t.db, "acme", "acme.invalid").await;

    let response = t.app.oneshot(get("/api/analytics/acme")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}
