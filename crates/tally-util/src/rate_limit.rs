//! Rate limiting utilities

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::ClientId;

/// Per-client fixed-window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per window
    max_requests: u32,
    /// Window length
    window: Duration,
    /// Per-client state
    clients: HashMap<ClientId, WindowState>,
}

#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests allowed per window
    /// * `window` - Window length
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: HashMap::new(),
        }
    }

    /// Check if a request should be allowed for the given client
    ///
    /// Returns `true` if allowed, `false` if rate limited
    pub fn check(&mut self, client_id: &ClientId) -> bool {
        let now = Instant::now();

        let state = self
            .clients
            .entry(client_id.clone())
            .or_insert(WindowState {
                window_start: now,
                count: 0,
            });

        if now.duration_since(state.window_start) >= self.window {
            state.window_start = now;
            state.count = 0;
        }

        if state.count < self.max_requests {
            state.count += 1;
            true
        } else {
            false
        }
    }

    /// Remove a client's rate limit state
    pub fn remove_client(&mut self, client_id: &ClientId) {
        self.clients.remove(client_id);
    }

    /// Clean up stale client entries
    pub fn cleanup(&mut self, stale_after: Duration) {
        let now = Instant::now();
        self.clients
            .retain(|_, state| now.duration_since(state.window_start) < stale_after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_within_limit() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
        let client = ClientId::new();

        for _ in 0..5 {
            assert!(limiter.check(&client));
        }

        // 6th request in the same window should be denied
        assert!(!limiter.check(&client));
    }

    #[test]
    fn clients_have_independent_windows() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
        let client1 = ClientId::new();
        let client2 = ClientId::new();

        assert!(limiter.check(&client1));
        assert!(limiter.check(&client1));
        assert!(!limiter.check(&client1));

        assert!(limiter.check(&client2));
        assert!(limiter.check(&client2));
    }

    #[test]
    fn removed_client_starts_fresh() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        let client = ClientId::new();

        assert!(limiter.check(&client));
        assert!(!limiter.check(&client));

        limiter.remove_client(&client);
        assert!(limiter.check(&client));
    }
}
