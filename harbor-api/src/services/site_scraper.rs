//! Best-effort homepage metadata scrape
//!
//! Used by the brand submission flow to prefill a new brand's name and
//! description. The scrape is unauthenticated, capped at 8 seconds, and
//! never fails the submission: any transport or decode problem yields
//! None and the caller falls back to domain-derived values.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(8);
const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Metadata extracted from a brand homepage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
}

pub struct SiteScraper {
    http: reqwest::Client,
}

impl SiteScraper {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .timeout(SCRAPE_TIMEOUT)
            .build()
            .expect("HTTP client construction only fails on TLS backend misconfiguration");
        Self { http }
    }

    /// Fetch `https://{domain}` and extract title / description / og:image
    ///
    /// Best effort: returns None on any failure.
    pub async fn fetch_site_meta(&self, domain: &str) -> Option<SiteMeta> {
        let url = format!("https://{}", domain);

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(domain, "Site scrape failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(domain, status = %response.status(), "Site scrape got non-success status");
            return None;
        }

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(domain, "Site scrape body read failed: {}", e);
                return None;
            }
        };

        Some(extract_meta(&html))
    }
}

impl Default for SiteScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract metadata from raw HTML
///
/// Regex-based by design: the scrape targets head tags only and must
/// tolerate arbitrarily broken markup further down the page.
pub fn extract_meta(html: &str) -> SiteMeta {
    SiteMeta {
        title: title_re()
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .filter(|t| !t.is_empty()),
        description: meta_content(html, description_re(), description_rev_re()),
        og_image: meta_content(html, og_image_re(), og_image_rev_re()),
    }
}

/// Match a meta tag with either attribute order
fn meta_content(html: &str, forward: &Regex, reversed: &Regex) -> Option<String> {
    forward
        .captures(html)
        .or_else(|| reversed.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|t| !t.is_empty())
}

fn clean_text(raw: &str) -> String {
    raw.replace(['\n', '\r', '\t'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap())
}

fn description_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]*name\s*=\s*["']description["'][^>]*content\s*=\s*["']([^"']*)["']"#)
            .unwrap()
    })
}

fn description_rev_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*name\s*=\s*["']description["']"#)
            .unwrap()
    })
}

fn og_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]*property\s*=\s*["']og:image["'][^>]*content\s*=\s*["']([^"']*)["']"#)
            .unwrap()
    })
}

fn og_image_rev_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*property\s*=\s*["']og:image["']"#)
            .unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_full_head() {
        let html = r#"<html><head>
            <title>Acme — Project Tracking</title>
            <meta name="description" content="Acme keeps projects on schedule.">
            <meta property="og:image" content="https://acme.com/og.png">
        </head><body></body></html>"#;

        let meta = extract_meta(html);
        assert_eq!(meta.title.as_deref(), Some("Acme — Project Tracking"));
        assert_eq!(
            meta.description.as_deref(),
            Some("Acme keeps projects on schedule.")
        );
        assert_eq!(meta.og_image.as_deref(), Some("https://acme.com/og.png"));
    }

    #[test]
    fn test_extract_reversed_attribute_order() {
        let html = r#"<meta content="Reversed order works" name="description">"#;
        let meta = extract_meta(html);
        assert_eq!(meta.description.as_deref(), Some("Reversed order works"));
    }

    #[test]
    fn test_extract_multiline_title_collapses_whitespace() {
        let html = "<title>\n  Acme\n  Cloud\n</title>";
        let meta = extract_meta(html);
        assert_eq!(meta.title.as_deref(), Some("Acme Cloud"));
    }

    #[test]
    fn test_extract_missing_tags_yields_none() {
        let meta = extract_meta("<html><body>no head tags</body></html>");
        assert_eq!(meta, SiteMeta::default());
    }

    #[test]
    fn test_empty_title_is_none() {
        let meta = extract_meta("<title>   </title>");
        assert_eq!(meta.title, None);
    }
}
