//! Token error types

use thiserror::Error;

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Token error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token is past its expiry time; distinct from a malformed token
    #[error("Token expired")]
    Expired,

    /// Token is well formed but has no live binding
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Binding store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TokenError {
    /// Whether the token was rejected for expiry
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Whether the caller should be treated as unauthenticated
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Expired | Self::Unauthorized(_) | Self::InvalidToken(_)
        )
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidToken(_) => "invalid_token",
            Self::InvalidKey(_) => "key",
            Self::Store(_) => "store",
            Self::Serialization(_) => "serialization",
        }
    }
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for TokenError {
    fn from(err: redis::RedisError) -> Self {
        Self::Store(err.to_string())
    }
}
