//! RSA key pair for token signing

use std::fmt;
use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::{TokenError, TokenResult};

/// Signing and verification keys for RS256 tokens
///
/// Accepts PKCS#1 (`RSA PRIVATE KEY` / `RSA PUBLIC KEY`) and PKCS#8/SPKI
/// (`PRIVATE KEY` / `PUBLIC KEY`) PEM documents.
#[derive(Clone)]
pub struct TokenKeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeyPair {
    /// Load from PEM bytes
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if either document is not an RSA key.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> TokenResult<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::InvalidKey(format!("private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::InvalidKey(format!("public key: {e}")))?;
        Ok(Self { encoding, decoding })
    }

    /// Load from PEM files
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if a file cannot be read or parsed.
    pub fn from_files(private_path: &Path, public_path: &Path) -> TokenResult<Self> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|e| {
                TokenError::InvalidKey(format!("failed to read {}: {e}", path.display()))
            })
        };
        let pair = Self::from_pem(&read(private_path)?, &read(public_path)?)?;
        debug!(
            private_key = %private_path.display(),
            public_key = %public_path.display(),
            "Loaded token key pair"
        );
        Ok(pair)
    }

    /// Load the key files named in the configuration
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if a path is missing or unreadable.
    pub fn from_config(config: &TokenConfig) -> TokenResult<Self> {
        match (&config.private_key_path, &config.public_key_path) {
            (Some(private), Some(public)) => Self::from_files(private, public),
            _ => Err(TokenError::InvalidKey(
                "private_key_path and public_key_path must both be set".to_string(),
            )),
        }
    }

    /// Generate a fresh key pair
    ///
    /// Intended for tests and local development; production keys should be
    /// provisioned and loaded from files.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if generation or encoding fails.
    pub fn generate(bits: usize) -> TokenResult<Self> {
        let private = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, bits)
            .map_err(|e| TokenError::InvalidKey(format!("key generation failed: {e}")))?;
        Self::from_rsa(&private)
    }

    /// Build from an existing RSA private key
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if the key cannot be encoded.
    pub fn from_rsa(private: &RsaPrivateKey) -> TokenResult<Self> {
        let private_pem = private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        let public_pem = RsaPublicKey::from(private)
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Self::from_pem(private_pem.as_bytes(), public_pem.as_bytes())
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for TokenKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeyPair")
            .field("algorithm", &"RS256")
            .finish_non_exhaustive()
    }
}
