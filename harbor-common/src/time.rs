//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Whether `stamp` is still within `ttl` of `reference`
///
/// Freshness is strict: a stamp aged exactly `ttl` is stale.
pub fn is_fresh(stamp: DateTime<Utc>, ttl: Duration, reference: DateTime<Utc>) -> bool {
    reference.signed_duration_since(stamp) < ttl
}
