//! Short-lived cache of "is this key currently valid" answers.
//!
//! Used for download gating, where the same key is checked repeatedly in a
//! short window. Entries are keyed by license key hash. Any status change
//! must call [`ValidityCache::invalidate`] before it returns, so a revoked
//! license is never served as valid.
//!
//! Moka bounds the entry count and evicts on wall-clock TTL; freshness on
//! read is judged against the injected [`Clock`].

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct CachedValidity {
    valid: bool,
    cached_at: DateTime<Utc>,
}

/// TTL cache of validity answers.
pub struct ValidityCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Cache<String, CachedValidity>,
}

impl ValidityCache {
    /// Create a cache holding at most `capacity` answers for `ttl` each.
    pub fn new(ttl: Duration, capacity: u64, clock: Arc<dyn Clock>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }

        Self {
            ttl,
            clock,
            entries: builder.build(),
        }
    }

    /// Cached answer for `key_hash`, if present and fresh.
    ///
    /// Stale entries are dropped on read. Entries dated in the future
    /// (clock moved backwards) are treated as stale.
    pub fn get(&self, key_hash: &str) -> Option<bool> {
        let entry = self.entries.get(key_hash)?;

        let age = self.clock.now_utc().signed_duration_since(entry.cached_at);
        let fresh = match age.to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => false,
        };
        if !fresh {
            self.entries.invalidate(key_hash);
            return None;
        }

        Some(entry.valid)
    }

    /// Remember an answer for `key_hash`.
    pub fn put(&self, key_hash: &str, valid: bool) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key_hash.to_string(),
            CachedValidity {
                valid,
                cached_at: self.clock.now_utc(),
            },
        );
    }

    /// Forget the answer for `key_hash`.
    pub fn invalidate(&self, key_hash: &str) {
        self.entries.invalidate(key_hash);
    }

    #[cfg(test)]
    pub(crate) fn settled_len(&self) -> u64 {
        for _ in 0..4 {
            self.entries.run_pending_tasks();
        }
        self.entries.entry_count()
    }
}
