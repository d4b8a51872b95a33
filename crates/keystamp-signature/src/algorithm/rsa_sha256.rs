//! SHA256-with-RSA over the raw-multiline form

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use sha2::Sha256;

use super::{SignatureAlgorithm, decode_signature, encode_signature};
use crate::canonical::SignatureRequest;
use crate::error::{SignatureError, SignatureResult};
use crate::key::KeyMaterial;

/// Asymmetric algorithm: RSASSA-PKCS1-v1_5 with SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256WithRsa;

impl Sha256WithRsa {
    const NAME: &'static str = "SHA256withRSA";

    fn mismatch() -> SignatureError {
        SignatureError::KeyMismatch {
            algorithm: Self::NAME,
        }
    }
}

impl SignatureAlgorithm for Sha256WithRsa {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn canonical_text(&self, request: &SignatureRequest) -> String {
        request.multiline_form()
    }

    fn sign(&self, request: &SignatureRequest, key: &KeyMaterial) -> SignatureResult<String> {
        let KeyMaterial::Rsa { private, .. } = key else {
            return Err(Self::mismatch());
        };
        let private = private.as_ref().ok_or_else(|| {
            SignatureError::InvalidKey("signing requires an RSA private key".to_string())
        })?;

        let signing_key = SigningKey::<Sha256>::new(private.clone());
        let signature = signing_key
            .try_sign(self.canonical_text(request).as_bytes())
            .map_err(|e| SignatureError::Crypto(format!("RSA signing failed: {e}")))?;
        Ok(encode_signature(&signature.to_bytes()))
    }

    fn verify(
        &self,
        request: &SignatureRequest,
        key: &KeyMaterial,
        signature: &str,
    ) -> SignatureResult<bool> {
        let KeyMaterial::Rsa { public, .. } = key else {
            return Err(Self::mismatch());
        };
        let Some(bytes) = decode_signature(signature) else {
            return Ok(false);
        };
        let Ok(signature) = Signature::try_from(bytes.as_slice()) else {
            return Ok(false);
        };

        let verifying_key = VerifyingKey::<Sha256>::new(public.clone());
        Ok(verifying_key
            .verify(self.canonical_text(request).as_bytes(), &signature)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;
    use std::sync::OnceLock;

    fn private_key() -> RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| {
            RsaPrivateKey::new(&mut rsa::rand_core::OsRng, 2048).expect("RSA key generation")
        })
        .clone()
    }

    fn request(body: Option<&str>) -> SignatureRequest {
        SignatureRequest::new(
            "POST",
            "/v1/orders",
            "abcdefghijabcdefghijabcdefghij12",
            "1700000000000",
            Some("name=%E5%BC%A0%E4%B8%89&id=2"),
            body.map(str::to_string),
        )
    }

    #[test]
    fn test_round_trip_with_public_only_verifier() {
        let signer_key = KeyMaterial::rsa_private(private_key());
        let verifier_key = KeyMaterial::rsa_public(private_key().to_public_key());

        let signature = Sha256WithRsa
            .sign(&request(Some("{\"a\":1}")), &signer_key)
            .unwrap();
        assert!(
            Sha256WithRsa
                .verify(&request(Some("{\"a\":1}")), &verifier_key, &signature)
                .unwrap()
        );
    }

    #[test]
    fn test_body_tamper_fails() {
        let key = KeyMaterial::rsa_private(private_key());
        let signature = Sha256WithRsa
            .sign(&request(Some("{\"a\":1}")), &key)
            .unwrap();
        assert!(
            !Sha256WithRsa
                .verify(&request(Some("{\"a\":2}")), &key, &signature)
                .unwrap()
        );
    }

    #[test]
    fn test_public_key_cannot_sign() {
        let key = KeyMaterial::rsa_public(private_key().to_public_key());
        let err = Sha256WithRsa.sign(&request(None), &key).unwrap_err();
        assert_eq!(err.category(), "invalid_key");
    }

    #[test]
    fn test_secret_material_is_a_mismatch() {
        let err = Sha256WithRsa
            .sign(&request(None), &KeyMaterial::secret("s"))
            .unwrap_err();
        assert_eq!(
            err,
            SignatureError::KeyMismatch {
                algorithm: "SHA256withRSA"
            }
        );
    }

    #[test]
    fn test_truncated_signature_is_false() {
        let key = KeyMaterial::rsa_private(private_key());
        let signature = Sha256WithRsa.sign(&request(None), &key).unwrap();
        let truncated = encode_signature(&decode_signature(&signature).unwrap()[..64]);
        assert!(!Sha256WithRsa.verify(&request(None), &key, &truncated).unwrap());
    }
}
