//! Nonce replay protection
//!
//! The timestamp window alone accepts a byte-identical replay for as long as
//! the window lasts. A [`NonceStore`] remembers `(access_id, nonce)` pairs for
//! the replay TTL so the second presentation is rejected.
//!
//! Entries expire on their own; the in-memory store is additionally
//! capacity-bounded with LRU eviction.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::EvictionPolicy;

/// Longest time a nonce is remembered, whatever TTL is requested
pub const MAX_NONCE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Seen-nonce tracking
#[async_trait]
pub trait NonceStore: Send + Sync + Debug {
    /// Record a nonce, returning `false` if it was already recorded
    async fn check_and_record(&self, access_id: &str, nonce: &str, ttl: Duration) -> bool;
}

/// Per-entry expiry: the value is the absolute expiration instant
struct NonceExpiry;

impl moka::Expiry<String, Instant> for NonceExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Instant,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.saturating_duration_since(created_at))
    }
}

/// In-memory nonce store backed by a [`moka::future::Cache`]
#[derive(Clone)]
pub struct MemoryNonceStore {
    seen: Cache<String, Instant>,
}

impl MemoryNonceStore {
    /// Create a store tracking at most `max_capacity` nonces
    pub fn new(max_capacity: u64) -> Self {
        let seen = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(NonceExpiry)
            .build();
        Self { seen }
    }

    fn key(access_id: &str, nonce: &str) -> String {
        format!("{access_id}\u{1f}{nonce}")
    }
}

impl Debug for MemoryNonceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNonceStore")
            .field("entries", &self.seen.entry_count())
            .finish()
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn check_and_record(&self, access_id: &str, nonce: &str, ttl: Duration) -> bool {
        let expires_at = Instant::now() + ttl.min(MAX_NONCE_TTL);
        // `entry().or_insert` is atomic per key, so two concurrent replays
        // cannot both observe a fresh nonce.
        let entry = self
            .seen
            .entry(Self::key(access_id, nonce))
            .or_insert(expires_at)
            .await;
        entry.is_fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_use_is_fresh_second_is_replay() {
        let store = MemoryNonceStore::new(100);
        let ttl = Duration::from_secs(60);
        assert!(store.check_and_record("app", "nonce-1", ttl).await);
        assert!(!store.check_and_record("app", "nonce-1", ttl).await);
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_capped() {
        let store = MemoryNonceStore::new(100);
        assert!(store.check_and_record("app", "nonce-1", Duration::MAX).await);
        assert!(!store.check_and_record("app", "nonce-1", Duration::MAX).await);
    }

    #[tokio::test]
    async fn test_nonce_scoped_per_access_id() {
        let store = MemoryNonceStore::new(100);
        let ttl = Duration::from_secs(60);
        assert!(store.check_and_record("app-a", "nonce-1", ttl).await);
        assert!(store.check_and_record("app-b", "nonce-1", ttl).await);
    }

    #[tokio::test]
    async fn test_expired_nonce_is_fresh_again() {
        let store = MemoryNonceStore::new(100);
        assert!(
            store
                .check_and_record("app", "nonce-1", Duration::from_millis(20))
                .await
        );
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(
            store
                .check_and_record("app", "nonce-1", Duration::from_millis(20))
                .await
        );
    }
}
