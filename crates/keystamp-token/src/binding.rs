//! Token bindings
//!
//! A binding maps a token id to the subject it was issued for. Validation
//! requires a live binding, so removing it revokes the token immediately even
//! though the JWT stays cryptographically valid until `exp`.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;

use crate::error::TokenResult;

/// Storage for `token_id -> subject` bindings
///
/// Implementations only need read-your-writes for a single caller.
#[async_trait]
pub trait TokenBindingStore: Send + Sync + Debug {
    /// Bind a token id to a subject
    ///
    /// `ttl` is the remaining token lifetime; stores may drop the binding
    /// once it elapses.
    async fn put(&self, token_id: &str, subject: &str, ttl: Duration) -> TokenResult<()>;

    /// Subject bound to `token_id`, if any
    async fn get(&self, token_id: &str) -> TokenResult<Option<String>>;

    /// Remove one binding
    async fn remove(&self, token_id: &str) -> TokenResult<()>;

    /// Remove every binding for `subject`, returning how many were removed
    async fn remove_subject(&self, subject: &str) -> TokenResult<usize>;
}

#[derive(Debug, Clone)]
struct Binding {
    subject: String,
    expires_at: Instant,
}

struct BindingExpiry;

impl moka::Expiry<String, Binding> for BindingExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Binding,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Binding,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(updated_at))
    }
}

/// In-process binding store backed by a [`moka::future::Cache`]
///
/// Suitable for single-instance deployments and tests. Bindings disappear on
/// restart, which revokes every outstanding token.
#[derive(Clone)]
pub struct MemoryTokenBindingStore {
    bindings: Cache<String, Binding>,
}

impl MemoryTokenBindingStore {
    /// Default maximum number of live bindings
    pub const DEFAULT_CAPACITY: u64 = 1_000_000;

    /// Create a store with [`Self::DEFAULT_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a store holding at most `max_capacity` bindings
    pub fn with_capacity(max_capacity: u64) -> Self {
        let bindings = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(BindingExpiry)
            .build();
        Self { bindings }
    }
}

impl Default for MemoryTokenBindingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MemoryTokenBindingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTokenBindingStore")
            .field("entries", &self.bindings.entry_count())
            .finish()
    }
}

#[async_trait]
impl TokenBindingStore for MemoryTokenBindingStore {
    async fn put(&self, token_id: &str, subject: &str, ttl: Duration) -> TokenResult<()> {
        let binding = Binding {
            subject: subject.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.bindings.insert(token_id.to_string(), binding).await;
        Ok(())
    }

    async fn get(&self, token_id: &str) -> TokenResult<Option<String>> {
        Ok(self
            .bindings
            .get(token_id)
            .await
            .map(|binding| binding.subject))
    }

    async fn remove(&self, token_id: &str) -> TokenResult<()> {
        self.bindings.invalidate(token_id).await;
        Ok(())
    }

    async fn remove_subject(&self, subject: &str) -> TokenResult<usize> {
        let token_ids: Vec<_> = self
            .bindings
            .iter()
            .filter(|(_, binding)| binding.subject == subject)
            .map(|(token_id, _)| token_id)
            .collect();
        for token_id in &token_ids {
            self.bindings.invalidate(token_id.as_str()).await;
        }
        Ok(token_ids.len())
    }
}
