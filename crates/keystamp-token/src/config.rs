//! Token configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Issuer and lifetime settings for issued tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TokenConfig {
    /// `iss` claim
    pub issuer: String,
    /// `aud` claim
    pub audience: String,
    /// Access token lifetime in seconds
    pub effective_time_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_effective_time_secs: u64,
    /// PEM file holding the RSA private key
    pub private_key_path: Option<PathBuf>,
    /// PEM file holding the RSA public key
    pub public_key_path: Option<PathBuf>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: "keystamp".to_string(),
            audience: "keystamp".to_string(),
            effective_time_secs: 2 * 60 * 60,
            refresh_effective_time_secs: 7 * 24 * 60 * 60,
            private_key_path: None,
            public_key_path: None,
        }
    }
}

impl TokenConfig {
    /// Set issuer and audience
    #[must_use]
    pub fn issued_by(mut self, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self.audience = audience.into();
        self
    }

    /// Set the access token lifetime
    #[must_use]
    pub fn effective_time(mut self, ttl: Duration) -> Self {
        self.effective_time_secs = ttl.as_secs();
        self
    }

    /// Set the refresh token lifetime
    #[must_use]
    pub fn refresh_effective_time(mut self, ttl: Duration) -> Self {
        self.refresh_effective_time_secs = ttl.as_secs();
        self
    }

    /// Default access token lifetime
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.effective_time_secs)
    }

    /// Default refresh token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_effective_time_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TokenConfig::default();
        assert_eq!(config.access_ttl(), Duration::from_secs(7200));
        assert_eq!(config.refresh_ttl(), Duration::from_secs(604_800));
        assert!(config.private_key_path.is_none());
    }

    #[test]
    fn test_builder() {
        let config = TokenConfig::default()
            .issued_by("auth.example.com", "api.example.com")
            .effective_time(Duration::from_secs(60));
        assert_eq!(config.issuer, "auth.example.com");
        assert_eq!(config.audience, "api.example.com");
        assert_eq!(config.effective_time_secs, 60);
    }
}
