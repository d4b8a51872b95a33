//! Tower Service for signature verification
//!
//! Header checks run first, so unsigned requests are rejected without reading
//! their bodies. The service buffers the body only when its content type is signed, hands
//! the request parts to [`RequestVerifier`] and rebuilds the request for the
//! inner service from the buffered bytes. Rejections short-circuit with a
//! [`SignatureRejection`] response.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tower_service::Service;
use tracing::debug;

use super::RequestVerifier;
use super::rejection::SignatureRejection;
use crate::verifier::{Verification, VerificationFailure};

/// Tower Service that verifies request signatures
#[derive(Debug, Clone)]
pub struct SignatureService<S> {
    inner: S,
    verifier: Arc<RequestVerifier>,
}

impl<S> SignatureService<S> {
    /// Create a new signature service
    pub fn new(inner: S, verifier: Arc<RequestVerifier>) -> Self {
        Self { inner, verifier }
    }

    /// Get a reference to the inner service
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the inner service
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

/// Future type for signature service responses
pub type SignatureServiceFuture<E> = BoxFuture<'static, Result<Response, E>>;

impl<S> Service<http::Request<Body>> for SignatureService<S>
where
    S: Service<http::Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = SignatureServiceFuture<S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        let inner = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner);

        if self.verifier.should_skip(req.method(), req.uri().path()) {
            return Box::pin(async move { inner.call(req).await });
        }

        let verifier = Arc::clone(&self.verifier);
        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            if let Err(failure) = verifier.precheck(&parts) {
                return Ok(reject(failure, parts.uri.path()));
            }

            let (buffered, body) = if verifier.requires_body(&parts.headers) {
                match axum::body::to_bytes(body, verifier.config().max_body_bytes).await {
                    Ok(bytes) => (Some(bytes.clone()), Body::from(bytes)),
                    Err(e) => {
                        debug!(error = %e, "Failed to buffer signed request body");
                        return Ok(SignatureRejection::new().into_response());
                    }
                }
            } else {
                (None, body)
            };

            match verifier.verify(&parts, buffered.as_deref()).await {
                Ok(Verification::Verified(account)) => {
                    parts.extensions.insert(account);
                }
                Ok(Verification::Skipped) => {}
                Err(failure) => return Ok(reject(failure, parts.uri.path())),
            }

            inner.call(http::Request::from_parts(parts, body)).await
        })
    }
}

fn reject(failure: VerificationFailure, path: &str) -> Response {
    debug!(
        reason = failure.error.reason().unwrap_or("internal"),
        category = failure.error.category(),
        path,
        "Rejected request signature"
    );
    SignatureRejection::from(failure).into_response()
}
