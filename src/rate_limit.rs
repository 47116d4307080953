//! Sliding-window rate limiter keyed by client and route. Counters live
//! in process memory; a restart resets them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            hits: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check-and-increment in one step. The request being checked counts
    /// against the window immediately, whether it is allowed or not.
    pub async fn check(&self, client: &str, route: &str) -> Result<(), ApiError> {
        let key = format!("{client}:{route}");
        let now = Instant::now();

        let mut hits = self.hits.write().await;
        let entry = hits.entry(key).or_default();
        entry.retain(|at| now.duration_since(*at) < self.window);
        entry.push(now);

        if entry.len() > self.max_requests {
            tracing::warn!(client = %client, route = %route, "rate limit exceeded");
            return Err(ApiError::TooManyRequests);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(2, 5);
        assert!(limiter.check("10.0.0.1", "/api/contacts").await.is_ok());
        assert!(limiter.check("10.0.0.1", "/api/contacts").await.is_ok());
        assert!(matches!(
            limiter.check("10.0.0.1", "/api/contacts").await,
            Err(ApiError::TooManyRequests)
        ));
    }

    #[tokio::test]
    async fn test_clients_and_routes_are_independent() {
        let limiter = RateLimiter::new(1, 5);
        assert!(limiter.check("10.0.0.1", "/api/contacts").await.is_ok());
        assert!(limiter.check("10.0.0.2", "/api/contacts").await.is_ok());
        assert!(limiter.check("10.0.0.1", "/api/contacts/7").await.is_ok());
        assert!(limiter.check("10.0.0.1", "/api/contacts").await.is_err());
    }

    #[tokio::test]
    async fn test_recovers_after_window_expires() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.check("10.0.0.1", "/api/contacts").await.is_ok());
        // Zero-length window means every prior hit is already stale.
        assert!(limiter.check("10.0.0.1", "/api/contacts").await.is_ok());
    }
}
