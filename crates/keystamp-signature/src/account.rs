//! Secret accounts and their resolution

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::algorithm::{SignatureAlgorithm, SignatureAlgorithmKind};
use crate::canonical::SignatureRequest;
use crate::error::SignatureResult;
use crate::key::KeyMaterial;

/// Credentials of one caller: access id, key material and bound algorithm
///
/// Accounts are created and rotated by an external credential store and are
/// read-only here. On successful verification the account is inserted into
/// the request extensions for downstream handlers.
#[derive(Clone)]
pub struct SecretAccount {
    access_id: String,
    secret_key_version: Option<String>,
    key: KeyMaterial,
    algorithm: Arc<dyn SignatureAlgorithm>,
}

impl SecretAccount {
    /// Create an account with an explicit algorithm strategy
    pub fn new(
        access_id: impl Into<String>,
        key: KeyMaterial,
        algorithm: Arc<dyn SignatureAlgorithm>,
    ) -> Self {
        Self {
            access_id: access_id.into(),
            secret_key_version: None,
            key,
            algorithm,
        }
    }

    /// HMAC-SHA256 account keyed by a shared secret
    pub fn hmac(access_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::new(
            access_id,
            KeyMaterial::secret(secret),
            SignatureAlgorithmKind::HmacSha256.algorithm(),
        )
    }

    /// SHA256-with-RSA account
    pub fn rsa(access_id: impl Into<String>, key: KeyMaterial) -> Self {
        Self::new(access_id, key, SignatureAlgorithmKind::Sha256WithRsa.algorithm())
    }

    /// Tag the account with a key version for rotation
    #[must_use]
    pub fn with_secret_key_version(mut self, version: impl Into<String>) -> Self {
        self.secret_key_version = Some(version.into());
        self
    }

    /// Access identifier sent in the access-id header
    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    /// Key version sent in the secret-version header, if any
    pub fn secret_key_version(&self) -> Option<&str> {
        self.secret_key_version.as_deref()
    }

    /// Key material
    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    /// Bound algorithm
    pub fn algorithm(&self) -> &Arc<dyn SignatureAlgorithm> {
        &self.algorithm
    }

    /// Sign with this account's algorithm and key
    ///
    /// # Errors
    ///
    /// Propagates algorithm errors (key mismatch, crypto failure).
    pub fn sign(&self, request: &SignatureRequest) -> SignatureResult<String> {
        self.algorithm.sign(request, &self.key)
    }

    /// Verify with this account's algorithm and key
    ///
    /// # Errors
    ///
    /// Propagates algorithm errors (key mismatch).
    pub fn verify(&self, request: &SignatureRequest, signature: &str) -> SignatureResult<bool> {
        self.algorithm.verify(request, &self.key, signature)
    }
}

impl fmt::Debug for SecretAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretAccount")
            .field("access_id", &self.access_id)
            .field("secret_key_version", &self.secret_key_version)
            .field("key", &self.key)
            .field("algorithm", &self.algorithm.name())
            .finish()
    }
}

/// Lookup of secret accounts by access id and optional key version
///
/// Implementations typically front a credential database or vault. A missing
/// account is `Ok(None)`; `Err` is reserved for lookup failures.
#[async_trait]
pub trait SecretAccountResolver: Send + Sync + fmt::Debug {
    /// Resolve an account
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be reached.
    async fn resolve(
        &self,
        access_id: &str,
        secret_key_version: Option<&str>,
    ) -> SignatureResult<Option<SecretAccount>>;
}

/// In-memory resolver keyed by `(access_id, version)`
///
/// An unversioned lookup returns the account registered without a version.
/// A versioned lookup falls back to the unversioned entry when no exact
/// version match exists.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretAccountResolver {
    accounts: HashMap<(String, Option<String>), SecretAccount>,
}

impl StaticSecretAccountResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account
    #[must_use]
    pub fn with_account(mut self, account: SecretAccount) -> Self {
        self.insert(account);
        self
    }

    /// Register an account in place
    pub fn insert(&mut self, account: SecretAccount) {
        let key = (
            account.access_id().to_string(),
            account.secret_key_version().map(str::to_string),
        );
        self.accounts.insert(key, account);
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether no accounts are registered
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl SecretAccountResolver for StaticSecretAccountResolver {
    async fn resolve(
        &self,
        access_id: &str,
        secret_key_version: Option<&str>,
    ) -> SignatureResult<Option<SecretAccount>> {
        let exact = self
            .accounts
            .get(&(access_id.to_string(), secret_key_version.map(str::to_string)));
        let account = match exact {
            Some(account) => Some(account),
            None if secret_key_version.is_some() => {
                self.accounts.get(&(access_id.to_string(), None))
            }
            None => None,
        };
        Ok(account.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_versions() {
        let resolver = StaticSecretAccountResolver::new()
            .with_account(SecretAccount::hmac("app", "v0-secret"))
            .with_account(SecretAccount::hmac("app", "v2-secret").with_secret_key_version("2"));

        let v2 = resolver.resolve("app", Some("2")).await.unwrap().unwrap();
        assert_eq!(v2.secret_key_version(), Some("2"));

        let fallback = resolver.resolve("app", Some("9")).await.unwrap().unwrap();
        assert_eq!(fallback.secret_key_version(), None);

        assert!(resolver.resolve("other", None).await.unwrap().is_none());
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn test_account_debug_hides_secret() {
        let account = SecretAccount::hmac("app", "hunter2-hunter2");
        let rendered = format!("{account:?}");
        assert!(rendered.contains("app"));
        assert!(rendered.contains("HmacSHA256"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_account_sign_and_verify() {
        let account = SecretAccount::hmac("app", "secret");
        let request = SignatureRequest::new("GET", "/", "n", "1", None, None);
        let signature = account.sign(&request).unwrap();
        assert!(account.verify(&request, &signature).unwrap());
    }
}
