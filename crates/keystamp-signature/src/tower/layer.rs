//! Tower Layer for signature verification

use std::sync::Arc;
use tower::Layer;

use super::RequestVerifier;
use super::service::SignatureService;

/// Tower Layer that verifies request signatures
///
/// Wraps inner services with [`SignatureService`].
#[derive(Debug, Clone)]
pub struct SignatureLayer {
    verifier: Arc<RequestVerifier>,
}

impl SignatureLayer {
    /// Create a layer from a verifier
    pub fn new(verifier: RequestVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Create a layer from a shared verifier
    pub fn from_arc(verifier: Arc<RequestVerifier>) -> Self {
        Self { verifier }
    }

    /// The verifier this layer installs
    pub fn verifier(&self) -> &RequestVerifier {
        &self.verifier
    }
}

impl<S> Layer<S> for SignatureLayer {
    type Service = SignatureService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SignatureService::new(inner, Arc::clone(&self.verifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SignatureConfig, StaticSecretAccountResolver};

    #[test]
    fn test_layer_shares_verifier() {
        let verifier = RequestVerifier::new(
            SignatureConfig::default().allow_path("/health"),
            Arc::new(StaticSecretAccountResolver::new()),
        )
        .unwrap();
        let layer = SignatureLayer::new(verifier);
        let cloned = layer.clone();
        assert!(Arc::ptr_eq(&layer.verifier, &cloned.verifier));
        assert!(layer.verifier().config().is_allowed_path("/health"));
    }
}
