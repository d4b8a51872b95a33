//! # Tower Middleware Integration
//!
//! [`SignatureLayer`] wraps an axum/tower service with [`RequestVerifier`].
//! Requests that fail verification never reach the inner service; they get a
//! uniform `400 Bad Request` JSON body instead.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::{Router, routing::post};
//! use keystamp_signature::{RequestVerifier, SignatureConfig, StaticSecretAccountResolver};
//! use keystamp_signature::tower::SignatureLayer;
//!
//! let resolver = StaticSecretAccountResolver::new()
//!     .with_account(SecretAccount::hmac("my-app", "shared-secret"));
//! let verifier = RequestVerifier::new(SignatureConfig::default(), Arc::new(resolver))?;
//!
//! let app = Router::new()
//!     .route("/v1/orders", post(create_order))
//!     .layer(SignatureLayer::new(verifier));
//! ```
//!
//! ## Request Extensions
//!
//! On success the verified [`SecretAccount`](crate::SecretAccount) is inserted
//! into the request's extensions:
//!
//! ```rust,ignore
//! async fn create_order(Extension(account): Extension<SecretAccount>) -> impl IntoResponse {
//!     format!("hello {}", account.access_id())
//! }
//! ```

mod layer;
mod rejection;
mod service;

pub use layer::SignatureLayer;
pub use rejection::SignatureRejection;
pub use service::{SignatureService, SignatureServiceFuture};

use crate::verifier::RequestVerifier;
