//! In-memory rate limiting for generation requests.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<String, VecDeque<Instant>>`,
//! keyed by caller identity (principal id for authenticated requests, client
//! IP for anonymous ones). Two ceilings are active concurrently: the caller
//! selects the anonymous or authenticated ceiling before calling in.
//!
//! TRADE-OFFS
//! ==========
//! Rejected requests are NOT recorded: they never consume window capacity, so
//! a throttled client that keeps retrying recovers as soon as its accepted
//! requests age out. Windows are per-process; under multiple instances the
//! effective ceiling is approximate, which the product tolerates for
//! throttling (unlike billing state, which lives in the shared store). The
//! limiter must never take the whole service down, so a poisoned lock is
//! recovered rather than propagated.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

const DEFAULT_ANONYMOUS_LIMIT: usize = 10;
const DEFAULT_AUTHENTICATED_LIMIT: usize = 30;
const DEFAULT_WINDOW_SECS: u64 = 60;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Ceiling for anonymous (IP-keyed) callers.
#[must_use]
pub fn anonymous_ceiling() -> (usize, Duration) {
    static VALUE: OnceLock<(usize, u64)> = OnceLock::new();
    let (limit, secs) = *VALUE.get_or_init(|| {
        (
            env_parse("RATE_LIMIT_ANONYMOUS", DEFAULT_ANONYMOUS_LIMIT),
            env_parse("RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW_SECS),
        )
    });
    (limit, Duration::from_secs(secs))
}

/// Ceiling for authenticated (principal-keyed) callers.
#[must_use]
pub fn authenticated_ceiling() -> (usize, Duration) {
    static VALUE: OnceLock<(usize, u64)> = OnceLock::new();
    let (limit, secs) = *VALUE.get_or_init(|| {
        (
            env_parse("RATE_LIMIT_AUTHENTICATED", DEFAULT_AUTHENTICATED_LIMIT),
            env_parse("RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW_SECS),
        )
    });
    (limit, Duration::from_secs(secs))
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded (max {limit} requests/{window_secs}s), retry in {retry_after_secs}s")]
    Exceeded { limit: usize, window_secs: u64, retry_after_secs: u64 },
}

impl RateLimitError {
    /// Seconds until the oldest recorded request ages out of the window.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            Self::Exceeded { retry_after_secs, .. } => *retry_after_secs,
        }
    }
}

/// Verdict for an accepted request.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    /// Requests still available in the current window, after this one.
    pub remaining: usize,
    /// How long until the window fully resets (oldest entry ages out).
    pub reset_after: Duration,
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone, Default)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sliding-window check: a request at time T is allowed iff fewer than
    /// `limit` accepted requests from `identity` fall in `(T - window, T]`.
    /// On allow, the request is recorded; on reject, nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::Exceeded`] with a retry-after hint when the
    /// window is full.
    pub fn check_and_consume(
        &self,
        identity: &str,
        limit: usize,
        window: Duration,
    ) -> Result<Decision, RateLimitError> {
        self.check_and_consume_at(identity, limit, window, Instant::now())
    }

    /// Internal: check + record with explicit timestamp (for testing).
    fn check_and_consume_at(
        &self,
        identity: &str,
        limit: usize,
        window: Duration,
        now: Instant,
    ) -> Result<Decision, RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let deque = inner.entry(identity.to_owned()).or_default();
        prune_window(deque, now, window);

        if deque.len() >= limit {
            let retry_after = deque
                .front()
                .map(|&oldest| window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(window);
            return Err(RateLimitError::Exceeded {
                limit,
                window_secs: window.as_secs(),
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        deque.push_back(now);
        let reset_after = deque
            .front()
            .map(|&oldest| window.saturating_sub(now.duration_since(oldest)))
            .unwrap_or(window);
        Ok(Decision { remaining: limit - deque.len(), reset_after })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

// An entry aged exactly `window` is outside `(now - window, now]` and expires.
fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) >= window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
