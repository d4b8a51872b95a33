//! Logging initialization
//!
//! Installs a `tracing` subscriber writing to stderr, plain or JSON. The
//! `RUST_LOG` environment variable takes precedence over the configured level.

use std::io;

use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `keystamp_signature=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub structured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            structured: false,
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already set.
    pub fn init(&self) -> io::Result<()> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let subscriber = tracing_subscriber::registry().with(filter);

        if self.structured {
            subscriber
                .with(fmt::layer().json().with_writer(io::stderr))
                .try_init()
                .map_err(|e| io::Error::other(e.to_string()))
        } else {
            subscriber
                .with(fmt::layer().with_writer(io::stderr))
                .try_init()
                .map_err(|e| io::Error::other(e.to_string()))
        }
    }
}
