//! # Keystamp
//!
//! Service-to-service authentication in two parts:
//!
//! - **Request signing** ([`signature`]) - every request carries an access
//!   id, timestamp, nonce and a signature over a canonical form of the
//!   request. Verification happens in a tower layer in front of your handlers.
//! - **Session tokens** ([`token`]) - RS256 access and refresh tokens that
//!   are only valid while a server-side binding exists, so they can be
//!   revoked before they expire.
//!
//! This crate re-exports both and adds layered configuration
//! ([`KeystampConfig`]), logging setup ([`LoggingConfig`]) and a unified
//! [`Error`] with HTTP status mapping.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keystamp::{KeystampConfig, SecretAccount, StaticSecretAccountResolver};
//!
//! # fn main() -> keystamp::Result<()> {
//! let config = KeystampConfig::from_file("keystamp.toml")?;
//! config.logging.init()?;
//!
//! let resolver = StaticSecretAccountResolver::new()
//!     .with_account(SecretAccount::hmac("billing", "shared-secret"));
//! let verifier = config.verifier(Arc::new(resolver))?;
//! # let _ = verifier;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `middleware` (default) - tower layer and `IntoResponse` for [`Error`]
//! - `reqwest` - sign outbound `reqwest::Request`s
//! - `redis-store` - Redis-backed token bindings
//! - `full` - everything above

pub mod config;
pub mod error;
pub mod logging;

pub use keystamp_signature as signature;
pub use keystamp_token as token;

pub use config::{ConfigError, DEFAULT_ENV_PREFIX, KeystampConfig};
pub use error::{Error, Result};
pub use logging::LoggingConfig;

pub use keystamp_core::{Clock, ManualClock, SharedClock, SystemClock};
pub use keystamp_signature::{
    KeyMaterial, MemoryNonceStore, NonceStore, RequestSigner, RequestVerifier, SecretAccount,
    SecretAccountResolver, SignatureAlgorithm, SignatureAlgorithmKind, SignatureConfig,
    SignatureError, SignatureRequest, StaticSecretAccountResolver,
};
pub use keystamp_token::{
    AuthenticationToken, AuthenticationTokenService, AuthenticationUser,
    MemoryTokenBindingStore, TokenBindingStore, TokenCodec, TokenConfig, TokenError,
    TokenKeyPair,
};

#[cfg(feature = "middleware")]
pub use keystamp_signature::tower::SignatureLayer;

#[cfg(feature = "redis-store")]
pub use keystamp_token::RedisTokenBindingStore;
