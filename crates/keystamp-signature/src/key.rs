//! Key material for signature algorithms

use std::fmt;

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{SignatureError, SignatureResult};

/// Secret or key pair bound to a [`SecretAccount`](crate::SecretAccount)
#[derive(Clone)]
pub enum KeyMaterial {
    /// Shared secret for HMAC-SHA256
    Secret(SecretString),
    /// RSA key pair for SHA256-with-RSA
    ///
    /// Verifiers only hold the public half; signers need the private key.
    Rsa {
        /// Private key, absent on the verifying side
        private: Option<RsaPrivateKey>,
        /// Public key
        public: RsaPublicKey,
    },
}

impl KeyMaterial {
    /// Wrap a shared secret
    pub fn secret(secret: impl Into<String>) -> Self {
        Self::Secret(SecretString::new(secret.into()))
    }

    /// Build RSA material from a private key (the public half is derived)
    pub fn rsa_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self::Rsa {
            private: Some(private),
            public,
        }
    }

    /// Build verify-only RSA material
    pub fn rsa_public(public: RsaPublicKey) -> Self {
        Self::Rsa {
            private: None,
            public,
        }
    }

    /// Parse a PKCS#8 `PRIVATE KEY` PEM
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidKey`] if the PEM cannot be decoded.
    pub fn rsa_private_pem(pem: &str) -> SignatureResult<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| SignatureError::InvalidKey(format!("RSA private key: {e}")))?;
        Ok(Self::rsa_private(private))
    }

    /// Parse an SPKI `PUBLIC KEY` PEM
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidKey`] if the PEM cannot be decoded.
    pub fn rsa_public_pem(pem: &str) -> SignatureResult<Self> {
        let public = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| SignatureError::InvalidKey(format!("RSA public key: {e}")))?;
        Ok(Self::rsa_public(public))
    }

    /// Shared secret bytes, if this is HMAC material
    pub(crate) fn secret_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Secret(secret) => Some(secret.expose_secret().as_bytes()),
            Self::Rsa { .. } => None,
        }
    }

    /// Short description of the material kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Secret(_) => "secret",
            Self::Rsa { private: Some(_), .. } => "rsa-keypair",
            Self::Rsa { private: None, .. } => "rsa-public",
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyMaterial").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let key = KeyMaterial::secret("super-secret-value");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("secret"));
    }

    #[test]
    fn test_secret_bytes() {
        let key = KeyMaterial::secret("abc");
        assert_eq!(key.secret_bytes(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let err = KeyMaterial::rsa_private_pem("not a pem").unwrap_err();
        assert_eq!(err.category(), "invalid_key");
        let err = KeyMaterial::rsa_public_pem("not a pem").unwrap_err();
        assert_eq!(err.category(), "invalid_key");
    }
}
