//! Layered configuration
//!
//! [`KeystampConfig`] aggregates the per-crate configs and loads them from a
//! TOML, YAML or JSON file with environment overrides:
//!
//! ```toml
//! [signature]
//! header_prefix = "X-Ca"
//! timestamp_window_secs = 300
//! allow_paths = ["/health", "/public/**"]
//!
//! [token]
//! issuer = "auth.example.com"
//! private_key_path = "/etc/keystamp/token.key"
//! public_key_path = "/etc/keystamp/token.pub"
//!
//! [logging]
//! level = "info"
//! structured = true
//! ```
//!
//! `KEYSTAMP_SIGNATURE__PRODUCTION=false` overrides `signature.production`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, Environment, File, FileFormat};
use keystamp_signature::{RequestSigner, RequestVerifier, SecretAccountResolver, SignatureConfig};
use keystamp_token::{
    AuthenticationTokenService, TokenBindingStore, TokenCodec, TokenConfig, TokenKeyPair,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::logging::LoggingConfig;

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "KEYSTAMP";

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeystampConfig {
    /// Request signing
    pub signature: SignatureConfig,
    /// Session tokens
    pub token: TokenConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl KeystampConfig {
    /// Load configuration from a file (TOML, YAML, or JSON)
    ///
    /// Environment variables prefixed `KEYSTAMP_` override file settings,
    /// with `__` separating nested keys.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use keystamp::KeystampConfig;
    ///
    /// let config = KeystampConfig::from_file("keystamp.toml").expect("Failed to load config");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, has an unsupported extension
    /// or does not deserialize.
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        Self::from_file_with_prefix(path, DEFAULT_ENV_PREFIX)
    }

    /// Load configuration from a file with a custom environment prefix
    ///
    /// # Errors
    ///
    /// See [`KeystampConfig::from_file`].
    pub fn from_file_with_prefix(
        path: impl AsRef<Path>,
        env_prefix: &str,
    ) -> std::result::Result<Self, ConfigError> {
        Self::load(path.as_ref(), environment(env_prefix))
    }

    fn load(path: &Path, environment: Environment) -> std::result::Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml" | "yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };

        let config = Config::builder()
            .add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ))
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Build an outbound signer
    ///
    /// # Errors
    ///
    /// Returns a signature configuration error for an invalid header prefix.
    pub fn signer(&self) -> Result<RequestSigner> {
        Ok(RequestSigner::new(&self.signature)?)
    }

    /// Build an inbound verifier
    ///
    /// # Errors
    ///
    /// Returns a signature configuration error for an invalid header prefix.
    pub fn verifier(&self, resolver: Arc<dyn SecretAccountResolver>) -> Result<RequestVerifier> {
        Ok(RequestVerifier::new(self.signature.clone(), resolver)?)
    }

    /// Build a token service, loading the key pair named in `token`
    ///
    /// # Errors
    ///
    /// Returns a token key error if the key files are missing or invalid.
    pub fn token_service(
        &self,
        bindings: Arc<dyn TokenBindingStore>,
    ) -> Result<AuthenticationTokenService> {
        let keys = TokenKeyPair::from_config(&self.token)?;
        let codec = TokenCodec::new(self.token.clone(), keys);
        Ok(AuthenticationTokenService::new(codec, bindings))
    }
}

fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
