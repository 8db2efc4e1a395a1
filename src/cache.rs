//! Content-addressed memoization of generation results.
//!
//! DESIGN
//! ======
//! Keys are a SHA-256 digest of the normalized brief (lowercased, trimmed
//! description plus optional industry/audience), so semantically identical
//! requests map to one entry. The cache sits after rate limiting and
//! principal validation but BEFORE budget reservation: a hit spends nothing
//! (no credit debit, no usage increment) and skips the generator entirely.
//! An empty cache degrades to always-miss, never an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::generator::types::{DesignBrief, DesignPayload};
use crate::tiers::Tier;

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

fn cache_ttl() -> Duration {
    static VALUE: OnceLock<u64> = OnceLock::new();
    let secs = *VALUE.get_or_init(|| {
        std::env::var("GENERATION_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
    });
    Duration::from_secs(secs)
}

// =============================================================================
// KEY DERIVATION
// =============================================================================

fn normalize(field: &str) -> String {
    field.trim().to_lowercase()
}

/// Deterministic cache key over the semantic request. Case- and surrounding-
/// whitespace-insensitive per field; an absent optional field hashes
/// differently from an empty one.
#[must_use]
pub fn cache_key(description: &str, industry: Option<&str>, audience: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(description).as_bytes());
    for field in [industry, audience] {
        match field {
            Some(value) => {
                hasher.update([1u8]);
                hasher.update(normalize(value).as_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
    let bytes = hasher.finalize();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Cache key for a full brief.
#[must_use]
pub fn brief_key(brief: &DesignBrief) -> String {
    cache_key(&brief.brand_description, brief.industry.as_deref(), brief.audience.as_deref())
}

// =============================================================================
// CACHE
// =============================================================================

/// A previously generated design system and the tier it was produced at.
#[derive(Debug, Clone)]
pub struct CachedDesign {
    pub payload: DesignPayload,
    pub tier: Tier,
}

struct Slot {
    design: CachedDesign,
    stored_at: Instant,
}

#[derive(Clone)]
pub struct DesignCache {
    inner: Arc<Mutex<HashMap<String, Slot>>>,
    ttl: Duration,
}

impl DesignCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(cache_ttl())
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), ttl }
    }

    /// Look up a key. Entries older than the TTL are treated as absent and
    /// dropped on access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CachedDesign> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<CachedDesign> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match inner.get(key) {
            Some(slot) if now.duration_since(slot.stored_at) < self.ttl => {
                Some(slot.design.clone())
            }
            Some(_) => {
                inner.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a generation result under `key`, replacing any previous entry.
    pub fn put(&self, key: String, payload: DesignPayload, tier: Tier) {
        self.put_at(key, payload, tier, Instant::now());
    }

    fn put_at(&self, key: String, payload: DesignPayload, tier: Tier, now: Instant) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.insert(key, Slot { design: CachedDesign { payload, tier }, stored_at: now });
    }
}

impl Default for DesignCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
