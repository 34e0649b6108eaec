//! Per-IP submission rate limiting
//!
//! Keyed fixed-window counter held in AppState and injected where
//! needed, so multi-instance deployments can swap in a shared store
//! without touching handlers. State is process-local and resets on
//! restart; the one-hour window makes that an acceptable loss.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Entries are swept once the map grows past this many keys
const SWEEP_THRESHOLD: usize = 1024;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window (0 when denied)
    pub remaining: u32,
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by client IP
pub struct SubmissionLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<HashMap<IpAddr, Window>>,
}

impl SubmissionLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Standard production limiter: 5 submissions per hour per IP
    pub fn per_hour(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(3600))
    }

    /// Count one attempt from `ip` and decide whether it may proceed
    ///
    /// Denied attempts do not consume quota; the window resets `window`
    /// after its first counted request.
    pub async fn check(&self, ip: IpAddr) -> RateDecision {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if state.len() > SWEEP_THRESHOLD {
            let window = self.window;
            state.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = state.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            return RateDecision {
                allowed: false,
                remaining: 0,
            };
        }

        entry.count += 1;
        RateDecision {
            allowed: true,
            remaining: self.limit - entry.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[tokio::test]
    async fn test_limit_allows_then_denies() {
        let limiter = SubmissionLimiter::new(5, Duration::from_secs(3600));

        for i in 0..5 {
            let decision = limiter.check(ip(1)).await;
            assert!(decision.allowed, "request {} should pass", i + 1);
            assert_eq!(decision.remaining, 4 - i);
        }

        let sixth = limiter.check(ip(1)).await;
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
    }

    #[tokio::test]
    async fn test_ips_are_independent() {
        let limiter = SubmissionLimiter::new(1, Duration::from_secs(3600));

        assert!(limiter.check(ip(1)).await.allowed);
        assert!(!limiter.check(ip(1)).await.allowed);
        assert!(limiter.check(ip(2)).await.allowed);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let limiter = SubmissionLimiter::new(1, Duration::from_millis(40));

        assert!(limiter.check(ip(1)).await.allowed);
        assert!(!limiter.check(ip(1)).await.allowed);

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(limiter.check(ip(1)).await.allowed);
    }

    #[tokio::test]
    async fn test_denied_attempt_does_not_extend_window() {
        let limiter = SubmissionLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.check(ip(1)).await.allowed);
        // Hammering while denied must not push the reset further out
        for _ in 0..3 {
            assert!(!limiter.check(ip(1)).await.allowed);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.check(ip(1)).await.allowed);
    }
}
