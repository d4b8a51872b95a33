//! Signature algorithms
//!
//! Every algorithm chooses its own canonical form and emits signatures as
//! standard base64 (RFC 4648, padded). Signer and verifier share the same
//! implementation, so the encoding cannot drift between them.
//!
//! | Algorithm | Canonical form | Primitive |
//! |-----------|----------------|-----------|
//! | [`HmacSha256`] | digest form | HMAC-SHA256 |
//! | [`Sha256WithRsa`] | raw-multiline form | RSASSA-PKCS1-v1_5 / SHA-256 |

mod hmac_sha256;
mod rsa_sha256;

pub use hmac_sha256::HmacSha256;
pub use rsa_sha256::Sha256WithRsa;

use std::fmt::Debug;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::canonical::SignatureRequest;
use crate::error::SignatureResult;
use crate::key::KeyMaterial;

/// Strategy for turning a [`SignatureRequest`] into a signature
pub trait SignatureAlgorithm: Send + Sync + Debug {
    /// Stable algorithm name
    fn name(&self) -> &'static str;

    /// Canonical text this algorithm signs
    fn canonical_text(&self, request: &SignatureRequest) -> String;

    /// Sign the request
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::KeyMismatch`](crate::SignatureError::KeyMismatch)
    /// if `key` belongs to another algorithm family, or a crypto error if the
    /// primitive fails.
    fn sign(&self, request: &SignatureRequest, key: &KeyMaterial) -> SignatureResult<String>;

    /// Verify `signature` against the request
    ///
    /// Undecodable signature text yields `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::KeyMismatch`](crate::SignatureError::KeyMismatch)
    /// if `key` belongs to another algorithm family.
    fn verify(
        &self,
        request: &SignatureRequest,
        key: &KeyMaterial,
        signature: &str,
    ) -> SignatureResult<bool>;
}

/// Serializable algorithm selector used in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SignatureAlgorithmKind {
    /// HMAC-SHA256 over the digest form
    #[default]
    #[serde(rename = "HmacSHA256", alias = "hmac-sha256")]
    HmacSha256,
    /// SHA256-with-RSA over the raw-multiline form
    #[serde(rename = "SHA256withRSA", alias = "sha256-with-rsa")]
    Sha256WithRsa,
}

impl SignatureAlgorithmKind {
    /// Instantiate the algorithm strategy
    pub fn algorithm(self) -> Arc<dyn SignatureAlgorithm> {
        match self {
            Self::HmacSha256 => Arc::new(HmacSha256),
            Self::Sha256WithRsa => Arc::new(Sha256WithRsa),
        }
    }
}

pub(crate) fn encode_signature(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode_signature(text: &str) -> Option<Vec<u8>> {
    STANDARD.decode(text.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_resolves_strategy() {
        assert_eq!(
            SignatureAlgorithmKind::HmacSha256.algorithm().name(),
            "HmacSHA256"
        );
        assert_eq!(
            SignatureAlgorithmKind::Sha256WithRsa.algorithm().name(),
            "SHA256withRSA"
        );
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: SignatureAlgorithmKind = serde_json::from_str("\"SHA256withRSA\"").unwrap();
        assert_eq!(kind, SignatureAlgorithmKind::Sha256WithRsa);
        let kind: SignatureAlgorithmKind = serde_json::from_str("\"hmac-sha256\"").unwrap();
        assert_eq!(kind, SignatureAlgorithmKind::HmacSha256);
        assert_eq!(
            serde_json::to_string(&SignatureAlgorithmKind::HmacSha256).unwrap(),
            "\"HmacSHA256\""
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_signature("%%%").is_none());
        assert_eq!(decode_signature(&encode_signature(b"abc")).unwrap(), b"abc");
    }
}
