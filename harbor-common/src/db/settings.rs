//! Settings database operations
//!
//! Provides get/set accessors for the settings table following a
//! key-value pattern. Secrets (provider API keys) live here so they can
//! be rotated without a redeploy; environment variables act as a
//! fallback for fresh installs.

use crate::{Error, Result};
use sqlx::{Pool, Sqlite};

#[cfg(test)]
use sqlx::SqlitePool;

/// Get a provider API key, preferring the settings table over env vars
///
/// Settings key: `{provider}_api_key` (e.g. `anthropic_api_key`).
/// Env fallback: `{PROVIDER}_API_KEY` (e.g. `ANTHROPIC_API_KEY`).
pub async fn get_provider_api_key(db: &Pool<Sqlite>, provider: &str) -> Result<Option<String>> {
    let key = format!("{}_api_key", provider);
    if let Some(value) = get_setting::<String>(db, &key).await? {
        return Ok(Some(value));
    }
    let env_var = format!("{}_API_KEY", provider.to_uppercase());
    Ok(std::env::var(env_var).ok().filter(|v| !v.is_empty()))
}

/// Set a provider API key in the settings table
pub async fn set_provider_api_key(db: &Pool<Sqlite>, provider: &str, key: String) -> Result<()> {
    set_setting(db, &format!("{}_api_key", provider), key).await
}

/// Get the website crawler service endpoint
///
/// Settings key `crawler_endpoint`, env fallback `HARBOR_CRAWLER_ENDPOINT`.
pub async fn get_crawler_endpoint(db: &Pool<Sqlite>) -> Result<Option<String>> {
    if let Some(value) = get_setting::<String>(db, "crawler_endpoint").await? {
        return Ok(Some(value));
    }
    Ok(std::env::var("HARBOR_CRAWLER_ENDPOINT")
        .ok()
        .filter(|v| !v.is_empty()))
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
