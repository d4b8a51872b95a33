//! Signature header names
//!
//! Names are `<prefix>-<suffix>` with a configurable prefix and fixed
//! suffixes. They are computed once when the signer or verifier is built.

use http::HeaderName;

use crate::error::{SignatureError, SignatureResult};

/// Default header prefix
pub const DEFAULT_HEADER_PREFIX: &str = "X-Keystamp";

/// Debug header carrying the server's canonical signing text (non-production only)
pub const DEBUG_SIGN_TEXT_HEADER: &str = "x-signature-debug-text";

/// Debug header carrying the server's canonical query string (non-production only)
pub const DEBUG_QUERY_HEADER: &str = "x-signature-debug-query";

const ACCESS_ID_SUFFIX: &str = "AccessId";
const SECRET_VERSION_SUFFIX: &str = "SecretVersion";
const TIMESTAMP_SUFFIX: &str = "Timestamp";
const NONCE_SUFFIX: &str = "Nonce";
const SIGN_SUFFIX: &str = "Sign";

/// Resolved header names for one prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaderNames {
    /// `<prefix>-AccessId`
    pub access_id: HeaderName,
    /// `<prefix>-SecretVersion`
    pub secret_version: HeaderName,
    /// `<prefix>-Timestamp`
    pub timestamp: HeaderName,
    /// `<prefix>-Nonce`
    pub nonce: HeaderName,
    /// `<prefix>-Sign`
    pub sign: HeaderName,
}

impl SignatureHeaderNames {
    /// Build header names from a prefix
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Configuration`] if the prefix produces an
    /// invalid header name.
    pub fn with_prefix(prefix: &str) -> SignatureResult<Self> {
        let prefix = prefix.trim_end_matches('-');
        let name = |suffix: &str| {
            HeaderName::try_from(format!("{prefix}-{suffix}")).map_err(|e| {
                SignatureError::Configuration(format!("invalid header prefix '{prefix}': {e}"))
            })
        };

        Ok(Self {
            access_id: name(ACCESS_ID_SUFFIX)?,
            secret_version: name(SECRET_VERSION_SUFFIX)?,
            timestamp: name(TIMESTAMP_SUFFIX)?,
            nonce: name(NONCE_SUFFIX)?,
            sign: name(SIGN_SUFFIX)?,
        })
    }
}

impl Default for SignatureHeaderNames {
    fn default() -> Self {
        Self {
            access_id: HeaderName::from_static("x-keystamp-accessid"),
            secret_version: HeaderName::from_static("x-keystamp-secretversion"),
            timestamp: HeaderName::from_static("x-keystamp-timestamp"),
            nonce: HeaderName::from_static("x-keystamp-nonce"),
            sign: HeaderName::from_static("x-keystamp-sign"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_default_prefix() {
        assert_eq!(
            SignatureHeaderNames::with_prefix(DEFAULT_HEADER_PREFIX).unwrap(),
            SignatureHeaderNames::default()
        );
    }

    #[test]
    fn test_custom_prefix() {
        let names = SignatureHeaderNames::with_prefix("X-Ca-").unwrap();
        assert_eq!(names.access_id.as_str(), "x-ca-accessid");
        assert_eq!(names.secret_version.as_str(), "x-ca-secretversion");
        assert_eq!(names.timestamp.as_str(), "x-ca-timestamp");
        assert_eq!(names.nonce.as_str(), "x-ca-nonce");
        assert_eq!(names.sign.as_str(), "x-ca-sign");
    }

    #[test]
    fn test_invalid_prefix() {
        let err = SignatureHeaderNames::with_prefix("bad prefix").unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
