//! # Keystamp Signature - Canonical Request Signing
//!
//! Authenticates HTTP requests between services with a per-request signature
//! over a canonical serialization of the request. Signer and verifier share an
//! access id plus either a shared secret (HMAC-SHA256) or an RSA key pair
//! (SHA256-with-RSA).
//!
//! ## Core Features
//!
//! - **Canonical requests** - query parameters sorted and decoded, bodies
//!   signed only for JSON and form content types
//! - **Pluggable algorithms** - HMAC-SHA256 over a digest form, SHA256-with-RSA
//!   over a raw multiline form
//! - **Freshness** - timestamp window plus optional nonce replay store
//! - **Tower middleware** - drop-in layer for axum routers
//!
//! ## Architecture
//!
//! - `canonical` - [`SignatureRequest`] and query canonicalization
//! - `algorithm` - [`SignatureAlgorithm`] strategies
//! - `account` - [`SecretAccount`] and [`SecretAccountResolver`]
//! - `signer` - outbound [`RequestSigner`]
//! - `verifier` - inbound [`RequestVerifier`]
//! - `nonce` - [`NonceStore`] replay protection
//! - `tower` - Tower layer/service (feature-gated: `middleware`)
//!
//! ## Feature Flags
//!
//! - `middleware` (default) - [`SignatureLayer`](crate::tower::SignatureLayer) for axum/tower stacks
//! - `reqwest` - sign outbound `reqwest::Request`s

pub mod account;
pub mod algorithm;
pub mod canonical;
pub mod config;
pub mod error;
pub mod headers;
pub mod key;
pub mod nonce;
pub mod signer;
pub mod verifier;

#[cfg(feature = "middleware")]
pub mod tower;

pub use account::{SecretAccount, SecretAccountResolver, StaticSecretAccountResolver};
pub use algorithm::{HmacSha256, Sha256WithRsa, SignatureAlgorithm, SignatureAlgorithmKind};
pub use canonical::{SignatureRequest, body_participates, canonical_query_string};
pub use config::SignatureConfig;
pub use error::{SIGN_VERIFY_ERROR, SignatureError, SignatureResult};
pub use headers::{
    DEBUG_QUERY_HEADER, DEBUG_SIGN_TEXT_HEADER, DEFAULT_HEADER_PREFIX, SignatureHeaderNames,
};
pub use key::KeyMaterial;
pub use nonce::{MemoryNonceStore, NonceStore};
pub use signer::RequestSigner;
pub use verifier::{RequestVerifier, SignatureDebug, Verification, VerificationFailure};
