//! Signature error types

use thiserror::Error;

/// Result type for signing and verification
pub type SignatureResult<T> = Result<T, SignatureError>;

/// Message returned to callers for every verification rejection
pub const SIGN_VERIFY_ERROR: &str = "sign verify error";

/// Signature error types
///
/// Verification rejections all collapse into [`SignatureError::BadRequest`],
/// whose display text never says which check failed. The `reason` is kept for
/// server-side logging only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("sign verify error")]
    BadRequest { reason: String },

    #[error("Key material does not match algorithm {algorithm}")]
    KeyMismatch { algorithm: &'static str },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SignatureError {
    /// Create a verification rejection with an internal reason
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    /// Internal reason for a rejection, suitable for logs but not responses
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::BadRequest { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether this error is a client-facing rejection
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest { .. })
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::KeyMismatch { .. } => "key_mismatch",
            Self::InvalidKey(_) => "invalid_key",
            Self::Crypto(_) => "crypto",
            Self::Configuration(_) => "configuration",
        }
    }
}
