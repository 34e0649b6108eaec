//! Brand submission API handler
//!
//! POST /api/brands/add validates the submitted domain and email,
//! enforces the per-IP rate limit, scrapes the homepage for prefill
//! metadata, and creates the brand row. Resubmitting an existing domain
//! is not an error: the existing slug is returned with `existing: true`.

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;
use tracing::info;

use crate::db::brands::{self, NewBrand};
use crate::error::{ApiError, ApiResult};
use crate::models::FeedData;
use crate::AppState;
use harbor_common::events::HarborEvent;
use harbor_common::{slug::slugify, time};

/// Email hosts that never correspond to a real vendor domain
const DISPOSABLE_EMAIL_DOMAINS: &[&str] = &[
    "mailinator.com",
    "guerrillamail.com",
    "10minutemail.com",
    "tempmail.com",
    "temp-mail.org",
    "throwawaymail.com",
    "yopmail.com",
    "sharklasers.com",
    "getnada.com",
    "dispostable.com",
    "maildrop.cc",
    "trashmail.com",
];

/// POST /api/brands/add request
#[derive(Debug, Deserialize)]
pub struct AddBrandRequest {
    pub domain: String,
    pub email: String,
    #[serde(default)]
    pub brand_name: Option<String>,
}

/// POST /api/brands/add response
#[derive(Debug, Serialize)]
pub struct AddBrandResponse {
    pub slug: String,
    /// true when the domain already had a brand row
    pub existing: bool,
}

/// POST /api/brands/add
pub async fn add_brand(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<AddBrandRequest>,
) -> ApiResult<Json<AddBrandResponse>> {
    let domain = normalize_domain(&request.domain)
        .ok_or_else(|| ApiError::BadRequest("Enter a valid domain, like acme.com".to_string()))?;

    let email = request.email.trim().to_ascii_lowercase();
    let email_host = email_host(&email)
        .ok_or_else(|| ApiError::BadRequest("Enter a valid email address".to_string()))?;

    if !email_matches_domain(email_host, &domain) {
        return Err(ApiError::BadRequest(format!(
            "Use an email on {} to submit this brand",
            domain
        )));
    }

    if DISPOSABLE_EMAIL_DOMAINS.contains(&email_host) {
        return Err(ApiError::BadRequest(
            "Disposable email addresses are not accepted".to_string(),
        ));
    }

    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let decision = state.limiter.check(ip).await;
    if !decision.allowed {
        return Err(ApiError::RateLimited(
            "Too many submissions from this address, try again in an hour".to_string(),
        ));
    }

    // Resubmission of a known domain returns the existing row untouched
    if let Some(existing) = brands::get_by_domain(&state.db, &domain).await? {
        return Ok(Json(AddBrandResponse {
            slug: existing.slug,
            existing: true,
        }));
    }

    // Best-effort homepage scrape for prefill metadata; failures fall
    // back to domain-derived values
    let meta = state.scraper.fetch_site_meta(&domain).await.unwrap_or_default();

    let brand_name = request
        .brand_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .or_else(|| meta.title.clone())
        .unwrap_or_else(|| fallback_brand_name(&domain));

    let feed_data = FeedData {
        description: meta.description.clone(),
        ..FeedData::default()
    };

    let new_brand = NewBrand {
        slug: slugify(&brand_name),
        brand_name,
        domain: domain.clone(),
        category: None,
        feed_data,
        submitted_email: Some(email),
    };

    // A slug collision with a different domain retries once with the
    // domain-derived slug
    let row = match brands::insert_brand(&state.db, new_brand.clone()).await {
        Ok(row) => row,
        Err(harbor_common::Error::InvalidInput(_)) => {
            let retry = NewBrand {
                slug: slugify(&domain),
                ..new_brand
            };
            brands::insert_brand(&state.db, retry).await?
        }
        Err(e) => return Err(e.into()),
    };

    info!(slug = %row.slug, domain = %row.domain, "Brand submitted");

    state.event_bus.emit(HarborEvent::BrandSubmitted {
        slug: row.slug.clone(),
        domain: row.domain.clone(),
        timestamp: time::now(),
    });

    Ok(Json(AddBrandResponse {
        slug: row.slug,
        existing: false,
    }))
}

/// Build brand routes
pub fn brand_routes() -> Router<AppState> {
    Router::new().route("/api/brands/add", post(add_brand))
}

/// Normalize user input into a bare registrable host
///
/// Strips scheme, `www.`, path, and port; validates the remainder
/// against a conservative hostname shape.
fn normalize_domain(input: &str) -> Option<String> {
    let mut domain = input.trim().to_ascii_lowercase();

    if let Some(rest) = domain.strip_prefix("https://") {
        domain = rest.to_string();
    } else if let Some(rest) = domain.strip_prefix("http://") {
        domain = rest.to_string();
    }

    if let Some(rest) = domain.strip_prefix("www.") {
        domain = rest.to_string();
    }

    if let Some(end) = domain.find(['/', '?', '#', ':']) {
        domain.truncate(end);
    }

    if domain_re().is_match(&domain) {
        Some(domain)
    } else {
        None
    }
}

/// Host part of a syntactically plausible email address
fn email_host(email: &str) -> Option<&str> {
    if !email_re().is_match(email) {
        return None;
    }
    email.rsplit_once('@').map(|(_, host)| host)
}

/// Whether the email host is the submitted domain or a subdomain of it
fn email_matches_domain(email_host: &str, domain: &str) -> bool {
    email_host == domain || email_host.ends_with(&format!(".{}", domain))
}

/// Derive the best client IP available
///
/// Prefers X-Forwarded-For (first hop) since the service typically sits
/// behind a proxy; falls back to the socket address, then loopback.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .or(peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

/// Capitalized domain stem, e.g. "acme.com" -> "Acme"
fn fallback_brand_name(domain: &str) -> String {
    let stem = domain.split('.').next().unwrap_or(domain);
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => domain.to_string(),
    }
}

fn domain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9-]*(\.[a-z0-9][a-z0-9-]*)+$").unwrap()
    })
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[a-z0-9][a-z0-9.-]*\.[a-z]{2,}$").unwrap())
}
