//! Brand row operations
//!
//! The brands table is the only datastore collaborator of the audit and
//! analytics flows: one read per request, one write per fresh
//! computation. JSON columns (`feed_data`, `audit_data`, `crawl_data`)
//! are decoded lazily; a malformed stored value degrades to "absent"
//! with a warning rather than failing the request.

use crate::models::{AuditBundle, BrandProfile, FeedData, StoredCrawl};
use chrono::{DateTime, Utc};
use harbor_common::{time, Error, Result};
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, slug, brand_name, domain, category, feed_data, audit_data, \
                              crawl_data, submitted_email, created_at, updated_at";

type BrandTuple = (
    String,                 // id
    String,                 // slug
    String,                 // brand_name
    String,                 // domain
    Option<String>,         // category
    Option<String>,         // feed_data
    Option<String>,         // audit_data
    Option<String>,         // crawl_data
    Option<String>,         // submitted_email
    DateTime<Utc>,          // created_at
    DateTime<Utc>,          // updated_at
);

/// One row of the brands table
#[derive(Debug, Clone)]
pub struct BrandRow {
    pub id: String,
    pub slug: String,
    pub brand_name: String,
    pub domain: String,
    pub category: Option<String>,
    pub feed_data: Option<String>,
    pub audit_data: Option<String>,
    pub crawl_data: Option<String>,
    pub submitted_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BrandTuple> for BrandRow {
    fn from(t: BrandTuple) -> Self {
        Self {
            id: t.0,
            slug: t.1,
            brand_name: t.2,
            domain: t.3,
            category: t.4,
            feed_data: t.5,
            audit_data: t.6,
            crawl_data: t.7,
            submitted_email: t.8,
            created_at: t.9,
            updated_at: t.10,
        }
    }
}

impl BrandRow {
    /// View of this row as an audit input
    pub fn profile(&self) -> BrandProfile {
        BrandProfile {
            slug: self.slug.clone(),
            brand_name: self.brand_name.clone(),
            domain: self.domain.clone(),
            category: self.category.clone(),
            feed_data: self.decode_json("feed_data", self.feed_data.as_deref()).unwrap_or_default(),
        }
    }

    /// The persisted audit bundle, if present and decodable
    pub fn stored_audit(&self) -> Option<AuditBundle> {
        self.decode_json("audit_data", self.audit_data.as_deref())
    }

    /// The persisted crawl cache, if present and decodable
    pub fn stored_crawl(&self) -> Option<StoredCrawl> {
        self.decode_json("crawl_data", self.crawl_data.as_deref())
    }

    fn decode_json<T: serde::de::DeserializeOwned>(
        &self,
        column: &str,
        raw: Option<&str>,
    ) -> Option<T> {
        let raw = raw?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(slug = %self.slug, column, "Discarding undecodable stored JSON: {}", e);
                None
            }
        }
    }
}

/// Fields required to create a brand row
#[derive(Debug, Clone)]
pub struct NewBrand {
    pub slug: String,
    pub brand_name: String,
    pub domain: String,
    pub category: Option<String>,
    pub feed_data: FeedData,
    pub submitted_email: Option<String>,
}

/// Fetch a brand by slug
pub async fn get_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<BrandRow>> {
    let row: Option<BrandTuple> = sqlx::query_as(&format!(
        "SELECT {} FROM brands WHERE slug = ?",
        SELECT_COLUMNS
    ))
    .bind(slug)
    .fetch_optional(db)
    .await?;

    Ok(row.map(BrandRow::from))
}

/// Fetch a brand by normalized domain
pub async fn get_by_domain(db: &SqlitePool, domain: &str) -> Result<Option<BrandRow>> {
    let row: Option<BrandTuple> = sqlx::query_as(&format!(
        "SELECT {} FROM brands WHERE domain = ?",
        SELECT_COLUMNS
    ))
    .bind(domain)
    .fetch_optional(db)
    .await?;

    Ok(row.map(BrandRow::from))
}

/// Insert a new brand row and return it
///
/// Fails with `Error::InvalidInput` on a slug or domain UNIQUE
/// violation; callers retry with a domain-derived slug.
pub async fn insert_brand(db: &SqlitePool, brand: NewBrand) -> Result<BrandRow> {
    let id = Uuid::new_v4().to_string();
    let now = time::now();
    let feed_json = serde_json::to_string(&brand.feed_data)
        .map_err(|e| Error::Internal(format!("Feed data serialization failed: {}", e)))?;

    let result = sqlx::query(
        "INSERT INTO brands (id, slug, brand_name, domain, category, feed_data, \
         submitted_email, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&brand.slug)
    .bind(&brand.brand_name)
    .bind(&brand.domain)
    .bind(&brand.category)
    .bind(&feed_json)
    .bind(&brand.submitted_email)
    .bind(now)
    .bind(now)
    .execute(db)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(Error::InvalidInput(format!(
                "Brand already exists: {}",
                brand.slug
            )));
        }
        Err(e) => return Err(Error::Database(e)),
    }

    get_by_slug(db, &brand.slug)
        .await?
        .ok_or_else(|| Error::Internal("Inserted brand not found".to_string()))
}

/// Overwrite the stored audit bundle for a brand
pub async fn update_audit_data(db: &SqlitePool, slug: &str, bundle: &AuditBundle) -> Result<()> {
    let json = serde_json::to_string(bundle)
        .map_err(|e| Error::Internal(format!("Audit bundle serialization failed: {}", e)))?;

    sqlx::query("UPDATE brands SET audit_data = ?, updated_at = ? WHERE slug = ?")
        .bind(&json)
        .bind(time::now())
        .bind(slug)
        .execute(db)
        .await?;

    Ok(())
}

/// Overwrite the stored crawl cache for a brand
pub async fn update_crawl_data(db: &SqlitePool, slug: &str, crawl: &StoredCrawl) -> Result<()> {
    let json = serde_json::to_string(crawl)
        .map_err(|e| Error::Internal(format!("Crawl data serialization failed: {}", e)))?;

    sqlx::query("UPDATE brands SET crawl_data = ?, updated_at = ? WHERE slug = ?")
        .bind(&json)
        .bind(time::now())
        .bind(slug)
        .execute(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CrawlResult;

    async fn setup() -> SqlitePool {
        harbor_common::db::init_in_memory().await.unwrap()
    }

    fn new_brand(slug: &str, domain: &str) -> NewBrand {
        NewBrand {
            slug: slug.to_string(),
            brand_name: "Acme".to_string(),
            domain: domain.to_string(),
            category: Some("saas".to_string()),
            feed_data: FeedData {
                pricing: Some("$10/mo".to_string()),
                ..FeedData::default()
            },
            submitted_email: Some("founder@acme.com".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_by_slug() {
        let db = setup().await;
        let row = insert_brand(&db, new_brand("acme", "acme.com")).await.unwrap();

        assert_eq!(row.slug, "acme");
        assert_eq!(row.profile().feed_data.pricing.as_deref(), Some("$10/mo"));
        assert!(row.stored_audit().is_none());

        let fetched = get_by_slug(&db, "acme").await.unwrap();
        assert!(fetched.is_some());
        assert!(get_by_slug(&db, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_domain() {
        let db = setup().await;
        insert_brand(&db, new_brand("acme", "acme.com")).await.unwrap();

        let fetched = get_by_domain(&db, "acme.com").await.unwrap().unwrap();
        assert_eq!(fetched.slug, "acme");
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_invalid_input() {
        let db = setup().await;
        insert_brand(&db, new_brand("acme", "acme.com")).await.unwrap();

        let result = insert_brand(&db, new_brand("acme", "other.com")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_undecodable_audit_data_degrades_to_none() {
        let db = setup().await;
        insert_brand(&db, new_brand("acme", "acme.com")).await.unwrap();

        sqlx::query("UPDATE brands SET audit_data = 'not json' WHERE slug = 'acme'")
            .execute(&db)
            .await
            .unwrap();

        let row = get_by_slug(&db, "acme").await.unwrap().unwrap();
        assert!(row.stored_audit().is_none());
    }

    #[tokio::test]
    async fn test_crawl_data_roundtrip() {
        let db = setup().await;
        insert_brand(&db, new_brand("acme", "acme.com")).await.unwrap();

        let stored = StoredCrawl {
            result: CrawlResult {
                issues: vec!["no FAQ schema".to_string()],
                schemas_found: vec!["Organization".to_string()],
                readability_score: 63.0,
                schema_coverage: 0.25,
                pages_analyzed: 8,
            },
            crawled_at: time::now(),
        };
        update_crawl_data(&db, "acme", &stored).await.unwrap();

        let row = get_by_slug(&db, "acme").await.unwrap().unwrap();
        let crawl = row.stored_crawl().unwrap();
        assert_eq!(crawl.result.pages_analyzed, 8);
    }
}
