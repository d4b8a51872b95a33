//! HMAC-SHA256 over the digest form

use ring::hmac;

use super::{SignatureAlgorithm, decode_signature, encode_signature};
use crate::canonical::SignatureRequest;
use crate::error::{SignatureError, SignatureResult};
use crate::key::KeyMaterial;

/// Symmetric algorithm keyed by the account's shared secret
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256;

impl HmacSha256 {
    const NAME: &'static str = "HmacSHA256";

    fn key(key: &KeyMaterial) -> SignatureResult<hmac::Key> {
        let secret = key
            .secret_bytes()
            .ok_or(SignatureError::KeyMismatch {
                algorithm: Self::NAME,
            })?;
        Ok(hmac::Key::new(hmac::HMAC_SHA256, secret))
    }
}

impl SignatureAlgorithm for HmacSha256 {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn canonical_text(&self, request: &SignatureRequest) -> String {
        request.digest_form()
    }

    fn sign(&self, request: &SignatureRequest, key: &KeyMaterial) -> SignatureResult<String> {
        let key = Self::key(key)?;
        let tag = hmac::sign(&key, self.canonical_text(request).as_bytes());
        Ok(encode_signature(tag.as_ref()))
    }

    fn verify(
        &self,
        request: &SignatureRequest,
        key: &KeyMaterial,
        signature: &str,
    ) -> SignatureResult<bool> {
        let key = Self::key(key)?;
        let Some(provided) = decode_signature(signature) else {
            return Ok(false);
        };
        // ring compares tags in constant time
        Ok(hmac::verify(&key, self.canonical_text(request).as_bytes(), &provided).is_ok())
    }
}
