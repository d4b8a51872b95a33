//! Outbound request signing
//!
//! The signer generates a fresh nonce and timestamp, builds the
//! [`SignatureRequest`] for the outbound call and inserts the signature headers.
//! The body is read but never modified.
//!
//! ```rust
//! use keystamp_signature::{RequestSigner, SecretAccount, SignatureConfig};
//!
//! let signer = RequestSigner::new(&SignatureConfig::default())?;
//! let account = SecretAccount::hmac("my-app", "shared-secret");
//!
//! let mut request = http::Request::builder()
//!     .method("POST")
//!     .uri("https://api.example.com/v1/orders?b=2&a=1")
//!     .header("content-type", "application/json")
//!     .body(br#"{"sku":"A-1"}"#.to_vec())?;
//!
//! signer.sign(&mut request, &account)?;
//! assert!(request.headers().contains_key("x-keystamp-sign"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use keystamp_core::{SharedClock, SystemClock, random_alphanumeric};
use tracing::trace;

use crate::account::SecretAccount;
use crate::canonical::{SignatureRequest, body_participates};
use crate::config::SignatureConfig;
use crate::error::{SignatureError, SignatureResult};
use crate::headers::SignatureHeaderNames;

/// Length of generated nonces
pub const NONCE_LENGTH: usize = 32;

/// Client-side request signer
#[derive(Debug, Clone)]
pub struct RequestSigner {
    header_names: SignatureHeaderNames,
    clock: SharedClock,
}

impl RequestSigner {
    /// Create a signer using the system clock
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the header prefix is invalid.
    pub fn new(config: &SignatureConfig) -> SignatureResult<Self> {
        Ok(Self {
            header_names: config.header_names()?,
            clock: SystemClock::shared(),
        })
    }

    /// Replace the clock used for timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Header names this signer emits
    pub fn header_names(&self) -> &SignatureHeaderNames {
        &self.header_names
    }

    /// Build the signable request with a fresh nonce and timestamp
    pub fn signature_request(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> SignatureRequest {
        let body = body_participates(content_type)
            .then(|| String::from_utf8_lossy(body).into_owned());
        SignatureRequest::new(
            method.as_str(),
            path,
            random_alphanumeric(NONCE_LENGTH),
            self.clock.now_millis().to_string(),
            query,
            body,
        )
    }

    /// Compute the signature header set without touching a request
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or a header value is not valid
    /// header text.
    pub fn signed_headers(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
        account: &SecretAccount,
    ) -> SignatureResult<HeaderMap> {
        let request = self.signature_request(method, path, query, content_type, body);
        let signature = account.sign(&request)?;

        trace!(
            access_id = account.access_id(),
            algorithm = account.algorithm().name(),
            method = request.method(),
            path = request.request_path(),
            "Signed outbound request"
        );

        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(
            self.header_names.access_id.clone(),
            header_value(account.access_id())?,
        );
        if let Some(version) = account.secret_key_version() {
            headers.insert(
                self.header_names.secret_version.clone(),
                header_value(version)?,
            );
        }
        headers.insert(
            self.header_names.timestamp.clone(),
            header_value(request.timestamp())?,
        );
        headers.insert(
            self.header_names.nonce.clone(),
            header_value(request.nonce())?,
        );
        headers.insert(self.header_names.sign.clone(), header_value(&signature)?);
        Ok(headers)
    }

    /// Sign an `http::Request` in place by adding the signature headers
    ///
    /// # Errors
    ///
    /// See [`RequestSigner::signed_headers`].
    pub fn sign<B: AsRef<[u8]>>(
        &self,
        request: &mut http::Request<B>,
        account: &SecretAccount,
    ) -> SignatureResult<()> {
        let content_type = content_type(request.headers());
        let headers = self.signed_headers(
            request.method(),
            request.uri().path(),
            request.uri().query(),
            content_type.as_deref(),
            request.body().as_ref(),
            account,
        )?;
        request.headers_mut().extend(headers);
        Ok(())
    }

    /// Sign a `reqwest::Request` in place
    ///
    /// Streaming bodies cannot be read without consuming them and are signed
    /// as if empty.
    ///
    /// # Errors
    ///
    /// See [`RequestSigner::signed_headers`].
    #[cfg(feature = "reqwest")]
    pub fn sign_reqwest(
        &self,
        request: &mut reqwest::Request,
        account: &SecretAccount,
    ) -> SignatureResult<()> {
        let content_type = content_type(request.headers());
        let body = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .unwrap_or_default();
        let headers = self.signed_headers(
            request.method(),
            request.url().path(),
            request.url().query(),
            content_type.as_deref(),
            body,
            account,
        )?;
        request.headers_mut().extend(headers);
        Ok(())
    }
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn header_value(value: &str) -> SignatureResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| SignatureError::Configuration(format!("invalid header value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystamp_core::ManualClock;
    use std::sync::Arc;

    fn signer() -> RequestSigner {
        RequestSigner::new(&SignatureConfig::default())
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(1_700_000_000_000)))
    }

    #[test]
    fn test_sign_adds_all_headers() {
        let account = SecretAccount::hmac("app", "secret").with_secret_key_version("3");
        let mut request = http::Request::builder()
            .method("GET")
            .uri("https://api.example.com/v1/orders?id=1")
            .body(Vec::new())
            .unwrap();

        signer().sign(&mut request, &account).unwrap();

        let headers = request.headers();
        assert_eq!(headers["x-keystamp-accessid"], "app");
        assert_eq!(headers["x-keystamp-secretversion"], "3");
        assert_eq!(headers["x-keystamp-timestamp"], "1700000000000");
        assert_eq!(headers["x-keystamp-nonce"].len(), NONCE_LENGTH);
        assert!(!headers["x-keystamp-sign"].is_empty());
    }

    #[test]
    fn test_secret_version_omitted_when_unset() {
        let account = SecretAccount::hmac("app", "secret");
        let mut request = http::Request::new(Vec::<u8>::new());
        signer().sign(&mut request, &account).unwrap();
        assert!(!request.headers().contains_key("x-keystamp-secretversion"));
    }

    #[test]
    fn test_body_is_left_untouched() {
        let account = SecretAccount::hmac("app", "secret");
        let body = br#"{"sku":"A-1"}"#.to_vec();
        let mut request = http::Request::builder()
            .method("POST")
            .uri("/v1/orders")
            .header("content-type", "application/json")
            .body(body.clone())
            .unwrap();
        signer().sign(&mut request, &account).unwrap();
        assert_eq!(request.body(), &body);
    }

    #[test]
    fn test_body_only_signed_for_signed_content_types() {
        let signer = signer();
        let with_json = signer.signature_request(
            &Method::POST,
            "/upload",
            None,
            Some("application/json"),
            b"{}",
        );
        assert_eq!(with_json.request_body(), Some("{}"));

        let with_binary = signer.signature_request(
            &Method::POST,
            "/upload",
            None,
            Some("application/octet-stream"),
            b"\x00\x01",
        );
        assert_eq!(with_binary.request_body(), None);
    }

    #[test]
    fn test_fresh_nonce_per_request() {
        let signer = signer();
        let first = signer.signature_request(&Method::GET, "/", None, None, b"");
        let second = signer.signature_request(&Method::GET, "/", None, None, b"");
        assert_ne!(first.nonce(), second.nonce());
    }
}
