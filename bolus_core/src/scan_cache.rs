//! Expiring cache for meal-scan results keyed by image content.
//!
//! Keys are the lowercase hex SHA-256 of the raw image bytes, so the same
//! photo uploaded twice hits the same entry. `get` treats expired entries as
//! misses and evicts them; `put` always overwrites.

use std::time::{Duration, Instant};

use bolus_traits::clock::{Clock, MonotonicClock};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

pub const DEFAULT_SCAN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub struct ScanCache<V, C = MonotonicClock> {
    entries: DashMap<String, (V, Instant)>,
    ttl: Duration,
    clock: C,
}

impl<V: Clone> ScanCache<V, MonotonicClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, MonotonicClock::new())
    }
}

impl<V: Clone> Default for ScanCache<V, MonotonicClock> {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_TTL)
    }
}

impl<V: Clone, C: Clock> ScanCache<V, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[inline]
    fn expired(&self, stored_at: Instant) -> bool {
        self.clock.elapsed_since(stored_at) >= self.ttl
    }

    /// Cached value for `hash`, or `None` on miss or expiry.
    pub fn get(&self, hash: &str) -> Option<V> {
        {
            let entry = self.entries.get(hash)?;
            let (value, stored_at) = entry.value();
            if !self.expired(*stored_at) {
                return Some(value.clone());
            }
        }
        // The shard guard is released above; removing while holding it deadlocks.
        self.entries
            .remove_if(hash, |_, (_, stored_at)| self.expired(*stored_at));
        tracing::trace!(hash, "scan cache entry expired");
        None
    }

    /// Store `value` under `hash`, replacing any previous entry.
    pub fn put(&self, hash: impl Into<String>, value: V) {
        self.entries.insert(hash.into(), (value, self.clock.now()));
    }

    /// Lookup keyed by the image bytes themselves.
    pub fn get_image(&self, image: &[u8]) -> Option<V> {
        self.get(&content_hash(image))
    }

    /// Store keyed by the image bytes; returns the content hash used.
    pub fn put_image(&self, image: &[u8], value: V) -> String {
        let hash = content_hash(image);
        self.put(hash.clone(), value);
        hash
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, (_, stored_at)| !self.expired(*stored_at));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "scan cache purged");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolus_traits::ManualClock;

    #[test]
    fn content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(content_hash(b"abc").len(), 64);
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
    }

    #[test]
    fn miss_then_hit() {
        let cache: ScanCache<u32> = ScanCache::default();
        assert_eq!(cache.get("nope"), None);
        cache.put("k", 7);
        assert_eq!(cache.get("k"), Some(7));
    }

    #[test]
    fn put_overwrites() {
        let cache: ScanCache<&str> = ScanCache::default();
        cache.put("k", "rice");
        cache.put("k", "pasta");
        assert_eq!(cache.get("k"), Some("pasta"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entry_expires_at_ttl_and_is_evicted() {
        let clock = ManualClock::new();
        let cache = ScanCache::with_clock(Duration::from_secs(60), clock.clone());
        cache.put("k", 1u8);
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get("k"), Some(1));
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn overwrite_refreshes_age() {
        let clock = ManualClock::new();
        let cache = ScanCache::with_clock(Duration::from_secs(60), clock.clone());
        cache.put("k", 1u8);
        clock.advance(Duration::from_secs(50));
        cache.put("k", 2u8);
        clock.advance(Duration::from_secs(50));
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn image_keyed_roundtrip() {
        let cache: ScanCache<String> = ScanCache::default();
        let hash = cache.put_image(b"\x89PNG fake", "banana".to_string());
        assert_eq!(hash, content_hash(b"\x89PNG fake"));
        assert_eq!(cache.get_image(b"\x89PNG fake").as_deref(), Some("banana"));
        assert_eq!(cache.get_image(b"other"), None);
    }

    #[test]
    fn purge_removes_only_expired() {
        let clock = ManualClock::new();
        let cache = ScanCache::with_clock(Duration::from_secs(10), clock.clone());
        cache.put("old", 1u8);
        clock.advance(Duration::from_secs(6));
        cache.put("new", 2u8);
        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("new"), Some(2));
        assert_eq!(cache.get("old"), None);
    }

    #[test]
    fn concurrent_put_and_get() {
        let cache: ScanCache<usize> = ScanCache::default();
        std::thread::scope(|s| {
            for t in 0..4 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..100 {
                        let key = format!("{t}-{i}");
                        cache.put(key.clone(), i);
                        assert_eq!(cache.get(&key), Some(i));
                    }
                });
            }
        });
        assert_eq!(cache.len(), 400);
    }
}
