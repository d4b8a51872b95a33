//! # Keystamp Token - Session Tokens with Revocation
//!
//! RS256 access and refresh tokens whose validity additionally depends on a
//! server-side binding, so a token can be revoked before it expires.
//!
//! ## Architecture
//!
//! - `codec` - [`TokenCodec`] encodes and parses JWTs with expiry checks
//! - `binding` - [`TokenBindingStore`] contract and in-memory store
//! - `service` - [`AuthenticationTokenService`] issue/validate/revoke
//! - `redis_store` - Redis binding store (feature-gated: `redis-store`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keystamp_token::{
//!     AuthenticationTokenService, AuthenticationUser, MemoryTokenBindingStore, TokenCodec,
//!     TokenConfig, TokenKeyPair,
//! };
//!
//! # async fn example() -> Result<(), keystamp_token::TokenError> {
//! let codec = TokenCodec::new(TokenConfig::default(), TokenKeyPair::generate(2048)?);
//! let service = AuthenticationTokenService::new(codec, Arc::new(MemoryTokenBindingStore::new()));
//!
//! let token = service
//!     .generate_token(&AuthenticationUser::new("42", "alice"), None)
//!     .await?;
//! let validated = service.parse_and_validate_token(&token.token_value).await?;
//! assert_eq!(validated.subject, "42");
//!
//! service.revoke_all_token("42").await?;
//! assert!(service.parse_and_validate_token(&token.token_value).await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod service;
pub mod types;

#[cfg(feature = "redis-store")]
pub mod redis_store;

pub use binding::{MemoryTokenBindingStore, TokenBindingStore};
pub use codec::{TokenCodec, USER_CLAIM};
pub use config::TokenConfig;
pub use error::{TokenError, TokenResult};
pub use keys::TokenKeyPair;
pub use service::AuthenticationTokenService;
pub use types::{AuthenticationToken, AuthenticationUser, TokenKind};

#[cfg(feature = "redis-store")]
pub use redis_store::RedisTokenBindingStore;
