use std::time::{Duration, Instant};

use dashmap::DashMap;

const MAX_FAILURES: u32 = 10;
const WINDOW_SECS: u64 = 300;

/// Per-email login brute force limiter with a sliding window of failures.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check whether a login attempt for this email is allowed.
    pub fn check(&self, email: &str) -> Result<(), ()> {
        let window = Duration::from_secs(WINDOW_SECS);
        if let Some(entry) = self.entries.get(email) {
            let (count, start) = *entry;
            if start.elapsed() < window && count >= MAX_FAILURES {
                return Err(());
            }
        }
        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();
        let mut entry = self.entries.entry(email.to_string()).or_insert((0, now));
        let (count, start) = entry.value_mut();
        if start.elapsed() > Duration::from_secs(WINDOW_SECS) {
            *count = 0;
            *start = now;
        }
        *count += 1;
    }

    pub fn record_success(&self, email: &str) {
        self.entries.remove(email);
    }

    /// Remove stale entries older than the given duration.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_FAILURES {
            assert!(limiter.check("a@b.com").is_ok());
            limiter.record_failure("a@b.com");
        }
        assert!(limiter.check("a@b.com").is_err());
        // Other emails are unaffected.
        assert!(limiter.check("c@d.com").is_ok());
    }

    #[test]
    fn success_resets_the_counter() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_FAILURES {
            limiter.record_failure("a@b.com");
        }
        assert!(limiter.check("a@b.com").is_err());
        limiter.record_success("a@b.com");
        assert!(limiter.check("a@b.com").is_ok());
    }

    #[test]
    fn cleanup_evicts_stale_entries() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_FAILURES {
            limiter.record_failure("a@b.com");
        }
        assert!(limiter.check("a@b.com").is_err());

        // Nothing is older than five minutes yet.
        limiter.cleanup(Duration::from_secs(WINDOW_SECS));
        assert!(limiter.check("a@b.com").is_err());

        limiter.cleanup(Duration::ZERO);
        assert!(limiter.check("a@b.com").is_ok());
    }
}
