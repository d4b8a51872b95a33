//! Inbound request verification
//!
//! [`RequestVerifier`] is framework-agnostic: it takes request parts plus the
//! buffered body and returns the resolved [`SecretAccount`]. The tower layer in
//! [`crate::tower`] wires it into an HTTP stack.
//!
//! Checks run in order and stop at the first failure:
//!
//! 1. `OPTIONS` and allow-listed paths skip verification
//! 2. access-id header present
//! 3. timestamp parseable and inside the skew window, nonce and sign present
//! 4. body included only for signed content types
//! 5. canonical request rebuilt from the live request
//! 6. account resolved
//! 7. signature verified with the account's algorithm
//! 8. nonce not seen before (when a [`NonceStore`] is configured)

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{HeaderMap, Method};
use keystamp_core::{SharedClock, SystemClock};
use tracing::{debug, warn};

use crate::account::{SecretAccount, SecretAccountResolver};
use crate::canonical::{SignatureRequest, body_participates};
use crate::config::SignatureConfig;
use crate::error::{SignatureError, SignatureResult};
use crate::headers::SignatureHeaderNames;
use crate::nonce::{MemoryNonceStore, NonceStore};

/// Successful verification outcome
#[derive(Debug, Clone)]
pub enum Verification {
    /// Preflight or allow-listed request, no signature checked
    Skipped,
    /// Signature verified for this account
    Verified(SecretAccount),
}

impl Verification {
    /// The verified account, if verification ran
    pub fn account(&self) -> Option<&SecretAccount> {
        match self {
            Self::Skipped => None,
            Self::Verified(account) => Some(account),
        }
    }
}

/// Server-side canonical values echoed to clients outside production
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureDebug {
    /// Canonical text the server signed
    pub sign_text: String,
    /// Canonical query string, empty when absent
    pub query_string: String,
}

/// Verification rejection
#[derive(Debug, Clone)]
pub struct VerificationFailure {
    /// Underlying error; its display text is always generic
    pub error: SignatureError,
    /// Canonical values for client debugging, only set outside production
    pub debug: Option<SignatureDebug>,
}

impl VerificationFailure {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            error: SignatureError::bad_request(reason),
            debug: None,
        }
    }
}

impl From<SignatureError> for VerificationFailure {
    fn from(error: SignatureError) -> Self {
        Self { error, debug: None }
    }
}

/// Server-side signature verifier
#[derive(Debug, Clone)]
pub struct RequestVerifier {
    config: SignatureConfig,
    header_names: SignatureHeaderNames,
    resolver: Arc<dyn SecretAccountResolver>,
    nonce_store: Option<Arc<dyn NonceStore>>,
    clock: SharedClock,
}

impl RequestVerifier {
    /// Create a verifier
    ///
    /// When `config.replay_protection` is set an in-memory nonce store is
    /// installed; replace it with [`RequestVerifier::with_nonce_store`] for a
    /// shared store.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the header prefix is invalid.
    pub fn new(
        config: SignatureConfig,
        resolver: Arc<dyn SecretAccountResolver>,
    ) -> SignatureResult<Self> {
        let header_names = config.header_names()?;
        let nonce_store = config.replay_protection.then(|| {
            Arc::new(MemoryNonceStore::new(config.replay_cache_capacity)) as Arc<dyn NonceStore>
        });
        Ok(Self {
            config,
            header_names,
            resolver,
            nonce_store,
            clock: SystemClock::shared(),
        })
    }

    /// Replace (or remove) the nonce store
    #[must_use]
    pub fn with_nonce_store(mut self, store: Option<Arc<dyn NonceStore>>) -> Self {
        self.nonce_store = store;
        self
    }

    /// Replace the clock used for the skew window
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /// Header names this verifier reads
    pub fn header_names(&self) -> &SignatureHeaderNames {
        &self.header_names
    }

    /// Whether the request bypasses verification entirely
    pub fn should_skip(&self, method: &Method, path: &str) -> bool {
        method == Method::OPTIONS || self.config.is_allowed_path(path)
    }

    /// Whether the body must be buffered for verification
    pub fn requires_body(&self, headers: &HeaderMap) -> bool {
        body_participates(header_str(headers, &CONTENT_TYPE))
    }

    /// Verify a request
    ///
    /// `body` is the buffered request body; it is ignored unless the content
    /// type requires body signing.
    ///
    /// # Errors
    ///
    /// Returns a [`VerificationFailure`] wrapping
    /// [`SignatureError::BadRequest`] for every rejection, or the resolver's
    /// error if the account lookup itself fails.
    pub async fn verify(
        &self,
        parts: &Parts,
        body: Option<&[u8]>,
    ) -> Result<Verification, VerificationFailure> {
        let path = parts.uri.path();
        if self.should_skip(&parts.method, path) {
            debug!(method = %parts.method, path, "Signature verification skipped");
            return Ok(Verification::Skipped);
        }

        let headers = &parts.headers;
        let SignedHeaders {
            access_id,
            timestamp,
            nonce,
            signature,
        } = self.signed_headers(headers)?;
        let secret_version = header_str(headers, &self.header_names.secret_version);

        let request_body = if self.requires_body(headers) {
            body.map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        } else {
            None
        };
        let request = SignatureRequest::new(
            parts.method.as_str(),
            path,
            nonce,
            timestamp,
            parts.uri.query(),
            request_body,
        );

        let account = match self.resolver.resolve(access_id, secret_version).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return Err(VerificationFailure::rejected(format!(
                    "unknown account {access_id}"
                )));
            }
            Err(error) => {
                warn!(access_id, error = %error, "Secret account lookup failed");
                return Err(error.into());
            }
        };

        let verified = account.verify(&request, signature).unwrap_or_else(|error| {
            warn!(access_id, error = %error, "Signature verification errored");
            false
        });
        if !verified {
            return Err(VerificationFailure {
                error: SignatureError::bad_request("signature mismatch"),
                debug: self.debug_echo(&account, &request),
            });
        }

        if let Some(store) = &self.nonce_store
            && !store
                .check_and_record(access_id, nonce, self.config.replay_ttl())
                .await
        {
            warn!(access_id, "Replayed nonce rejected");
            return Err(VerificationFailure::rejected("nonce replayed"));
        }

        debug!(
            access_id,
            algorithm = account.algorithm().name(),
            path,
            "Signature verified"
        );
        Ok(Verification::Verified(account))
    }

    /// Header-only checks, run before the body is read
    ///
    /// # Errors
    ///
    /// Returns a [`VerificationFailure`] if a signature header is missing or
    /// the timestamp falls outside the window.
    pub fn precheck(&self, parts: &Parts) -> Result<(), VerificationFailure> {
        if self.should_skip(&parts.method, parts.uri.path()) {
            return Ok(());
        }
        self.signed_headers(&parts.headers).map(|_| ())
    }

    fn signed_headers<'a>(
        &self,
        headers: &'a HeaderMap,
    ) -> Result<SignedHeaders<'a>, VerificationFailure> {
        let names = &self.header_names;

        let access_id = header_str(headers, &names.access_id)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| VerificationFailure::rejected("missing access id header"))?;

        let timestamp = header_str(headers, &names.timestamp)
            .ok_or_else(|| VerificationFailure::rejected("missing timestamp header"))?;
        self.check_timestamp(timestamp)?;

        let nonce = header_str(headers, &names.nonce)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| VerificationFailure::rejected("missing nonce header"))?;
        let signature = header_str(headers, &names.sign)
            .ok_or_else(|| VerificationFailure::rejected("missing sign header"))?;

        Ok(SignedHeaders {
            access_id,
            timestamp,
            nonce,
            signature,
        })
    }

    fn check_timestamp(&self, timestamp: &str) -> Result<(), VerificationFailure> {
        let sent: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| VerificationFailure::rejected("unparseable timestamp"))?;
        let window = i64::try_from(self.config.window().as_millis()).unwrap_or(i64::MAX);
        let skew = self.clock.now_millis().saturating_sub(sent).saturating_abs();
        if skew > window {
            return Err(VerificationFailure::rejected(format!(
                "timestamp skew {skew}ms exceeds {window}ms"
            )));
        }
        Ok(())
    }

    fn debug_echo(
        &self,
        account: &SecretAccount,
        request: &SignatureRequest,
    ) -> Option<SignatureDebug> {
        if self.config.production {
            return None;
        }
        Some(SignatureDebug {
            sign_text: account.algorithm().canonical_text(request),
            query_string: request.query_string().unwrap_or_default().to_string(),
        })
    }
}

struct SignedHeaders<'a> {
    access_id: &'a str,
    timestamp: &'a str,
    nonce: &'a str,
    signature: &'a str,
}

fn header_str<'a, K>(headers: &'a HeaderMap, name: K) -> Option<&'a str>
where
    K: http::header::AsHeaderName,
{
    headers.get(name).and_then(|value| value.to_str().ok())
}
