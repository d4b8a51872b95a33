//! Signature verification configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SignatureResult;
use crate::headers::{DEFAULT_HEADER_PREFIX, SignatureHeaderNames};

/// Signature protocol configuration
///
/// Shared by signer and verifier so both sides agree on header names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SignatureConfig {
    /// Header prefix joined to fixed suffixes with `-`
    pub header_prefix: String,
    /// Allowed clock skew between signer and verifier, in seconds
    pub timestamp_window_secs: u64,
    /// Paths that bypass verification (`*` matches one segment, `**` the rest)
    pub allow_paths: Vec<String>,
    /// Production deployments never echo canonical text in debug headers
    pub production: bool,
    /// Upper bound for buffered request bodies
    pub max_body_bytes: usize,
    /// Reject nonces already seen inside the replay window
    pub replay_protection: bool,
    /// Maximum tracked nonces for the in-memory replay store
    pub replay_cache_capacity: u64,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            timestamp_window_secs: 300,
            allow_paths: Vec::new(),
            production: true,
            max_body_bytes: 10 * 1024 * 1024,
            replay_protection: true,
            replay_cache_capacity: 100_000,
        }
    }
}

impl SignatureConfig {
    /// Create a development config that exposes debug headers
    #[must_use]
    pub fn development() -> Self {
        Self {
            production: false,
            ..Default::default()
        }
    }

    /// Set the header prefix
    #[must_use]
    pub fn header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = prefix.into();
        self
    }

    /// Set the timestamp window
    #[must_use]
    pub fn timestamp_window(mut self, window: Duration) -> Self {
        self.timestamp_window_secs = window.as_secs();
        self
    }

    /// Add a path pattern to the allow-list
    #[must_use]
    pub fn allow_path(mut self, pattern: impl Into<String>) -> Self {
        self.allow_paths.push(pattern.into());
        self
    }

    /// Enable or disable nonce replay protection
    #[must_use]
    pub fn replay_protection(mut self, enabled: bool) -> Self {
        self.replay_protection = enabled;
        self
    }

    /// Timestamp window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.timestamp_window_secs)
    }

    /// How long a nonce stays in the replay store
    ///
    /// A request is accepted for `window` on either side of its timestamp.
    pub fn replay_ttl(&self) -> Duration {
        self.window().saturating_mul(2)
    }

    /// Resolve header names for the configured prefix
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid prefix.
    pub fn header_names(&self) -> SignatureResult<SignatureHeaderNames> {
        SignatureHeaderNames::with_prefix(&self.header_prefix)
    }

    /// Check if a path bypasses verification
    pub fn is_allowed_path(&self, path: &str) -> bool {
        self.allow_paths
            .iter()
            .any(|pattern| path_matches(pattern, path))
    }
}

/// Match a request path against an allow-list pattern
///
/// `*` matches exactly one segment and a trailing `**` matches any remainder,
/// including nothing.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.trim_matches('/').split('/');
    let mut path_segments = path.trim_matches('/').split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (Some("**"), _) => return true,
            (Some(expected), Some(actual)) => {
                if expected != "*" && expected != actual {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SignatureConfig::default();
        assert_eq!(config.header_prefix, "X-Keystamp");
        assert_eq!(config.window(), Duration::from_secs(300));
        assert_eq!(config.replay_ttl(), Duration::from_secs(600));
        assert!(config.production);
        assert!(config.replay_protection);
        assert!(config.allow_paths.is_empty());
    }

    #[test]
    fn test_replay_ttl_saturates_for_huge_window() {
        let config = SignatureConfig {
            timestamp_window_secs: u64::MAX,
            ..SignatureConfig::default()
        };
        assert_eq!(config.replay_ttl(), Duration::MAX);
    }

    #[test]
    fn test_development_config() {
        assert!(!SignatureConfig::development().production);
    }

    #[test]
    fn test_path_patterns() {
        assert!(path_matches("/health", "/health"));
        assert!(path_matches("/health", "/health/"));
        assert!(!path_matches("/health", "/healthz"));
        assert!(path_matches("/public/**", "/public"));
        assert!(path_matches("/public/**", "/public/a/b/c"));
        assert!(path_matches("/users/*/avatar", "/users/42/avatar"));
        assert!(!path_matches("/users/*/avatar", "/users/42/profile"));
        assert!(!path_matches("/users/*", "/users/42/avatar"));
    }

    #[test]
    fn test_allow_list() {
        let config = SignatureConfig::default()
            .allow_path("/health")
            .allow_path("/docs/**");
        assert!(config.is_allowed_path("/health"));
        assert!(config.is_allowed_path("/docs/openapi.json"));
        assert!(!config.is_allowed_path("/v1/orders"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SignatureConfig =
            serde_json::from_str(r#"{"timestamp_window_secs": 60, "production": false}"#).unwrap();
        assert_eq!(config.window(), Duration::from_secs(60));
        assert!(!config.production);
        assert_eq!(config.header_prefix, "X-Keystamp");
    }
}
