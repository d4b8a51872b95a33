//! Redis-backed token binding store
//!
//! Layout, with a configurable key prefix:
//!
//! - `<prefix>token:<token_id>` holds the subject, expiring with the token
//! - `<prefix>subject:<subject>` is a set of token ids used by
//!   [`TokenBindingStore::remove_subject`]
//!
//! Subject sets are kept alive for their longest-lived member and may hold ids
//! whose token key already expired; removal tolerates that.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::{debug, trace};

use crate::binding::TokenBindingStore;
use crate::error::{TokenError, TokenResult};

/// Default key prefix
pub const DEFAULT_KEY_PREFIX: &str = "keystamp:binding:";

/// Redis binding store
#[derive(Clone)]
pub struct RedisTokenBindingStore {
    connection: MultiplexedConnection,
    key_prefix: String,
}

impl RedisTokenBindingStore {
    /// Connect with the default key prefix
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Store`] if the client cannot connect or Redis
    /// does not answer `PING`.
    pub async fn new(connection_string: &str) -> TokenResult<Self> {
        Self::with_prefix(connection_string, DEFAULT_KEY_PREFIX).await
    }

    /// Connect with a custom key prefix
    ///
    /// # Errors
    ///
    /// See [`RedisTokenBindingStore::new`].
    pub async fn with_prefix(connection_string: &str, key_prefix: &str) -> TokenResult<Self> {
        let client = Client::open(connection_string)
            .map_err(|e| TokenError::Store(format!("Failed to create Redis client: {e}")))?;
        let mut connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| TokenError::Store(format!("Failed to connect to Redis: {e}")))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| TokenError::Store(format!("Redis ping failed: {e}")))?;

        debug!(key_prefix, "Redis binding store connected");

        Ok(Self {
            connection,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn token_key(&self, token_id: &str) -> String {
        format!("{}token:{token_id}", self.key_prefix)
    }

    fn subject_key(&self, subject: &str) -> String {
        format!("{}subject:{subject}", self.key_prefix)
    }
}

impl std::fmt::Debug for RedisTokenBindingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTokenBindingStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

/// Redis expirations are whole seconds and must be positive
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0)
}

#[async_trait]
impl TokenBindingStore for RedisTokenBindingStore {
    async fn put(&self, token_id: &str, subject: &str, ttl: Duration) -> TokenResult<()> {
        let seconds = ttl_secs(ttl).max(1);
        let token_key = self.token_key(token_id);
        let subject_key = self.subject_key(subject);
        let mut conn = self.connection.clone();

        let _: () = redis::pipe()
            .atomic()
            .set_ex(&token_key, subject, seconds)
            .ignore()
            .sadd(&subject_key, token_id)
            .ignore()
            // NX covers a fresh set, GT extends an existing one
            .cmd("EXPIRE")
            .arg(&subject_key)
            .arg(seconds)
            .arg("NX")
            .ignore()
            .cmd("EXPIRE")
            .arg(&subject_key)
            .arg(seconds)
            .arg("GT")
            .ignore()
            .query_async(&mut conn)
            .await?;

        trace!(token_id, subject, seconds, "Stored token binding");
        Ok(())
    }

    async fn get(&self, token_id: &str) -> TokenResult<Option<String>> {
        let mut conn = self.connection.clone();
        Ok(conn.get(self.token_key(token_id)).await?)
    }

    async fn remove(&self, token_id: &str) -> TokenResult<()> {
        let token_key = self.token_key(token_id);
        let mut conn = self.connection.clone();

        let subject: Option<String> = conn.get(&token_key).await?;
        let mut pipe = redis::pipe();
        pipe.atomic().del(&token_key).ignore();
        if let Some(subject) = subject {
            pipe.srem(self.subject_key(&subject), token_id).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn remove_subject(&self, subject: &str) -> TokenResult<usize> {
        let subject_key = self.subject_key(subject);
        let mut conn = self.connection.clone();

        let token_ids: Vec<String> = conn.smembers(&subject_key).await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for token_id in &token_ids {
            pipe.del(self.token_key(token_id));
        }
        pipe.del(&subject_key).ignore();
        let deleted: Vec<usize> = pipe.query_async(&mut conn).await?;

        Ok(deleted.into_iter().sum())
    }
}
