//! Rejection response for failed verification

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::{CONTROLS, utf8_percent_encode};
use serde_json::json;

use crate::error::SIGN_VERIFY_ERROR;
use crate::headers::{DEBUG_QUERY_HEADER, DEBUG_SIGN_TEXT_HEADER};
use crate::verifier::{SignatureDebug, VerificationFailure};

/// `400 Bad Request` returned for every verification failure
///
/// The body never says which check failed. Outside production the server's
/// canonical text and query string are echoed in debug headers.
#[derive(Debug, Clone)]
pub struct SignatureRejection {
    debug: Option<SignatureDebug>,
}

impl SignatureRejection {
    /// Rejection without debug information
    pub fn new() -> Self {
        Self { debug: None }
    }

    /// Debug information attached to this rejection
    pub fn debug(&self) -> Option<&SignatureDebug> {
        self.debug.as_ref()
    }
}

impl Default for SignatureRejection {
    fn default() -> Self {
        Self::new()
    }
}

impl From<VerificationFailure> for SignatureRejection {
    fn from(failure: VerificationFailure) -> Self {
        Self {
            debug: failure.debug,
        }
    }
}

impl IntoResponse for SignatureRejection {
    fn into_response(self) -> Response {
        let body = json!({
            "error": "bad_request",
            "error_description": SIGN_VERIFY_ERROR,
        });
        let mut resp = (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();

        if let Some(debug) = self.debug {
            let headers = resp.headers_mut();
            for (name, value) in [
                (DEBUG_SIGN_TEXT_HEADER, debug.sign_text),
                (DEBUG_QUERY_HEADER, debug.query_string),
            ] {
                let encoded = utf8_percent_encode(&value, CONTROLS).to_string();
                if let Ok(value) = HeaderValue::from_str(&encoded) {
                    headers.insert(name, value);
                }
            }
        }

        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rejection_has_no_debug_headers() {
        let resp = SignatureRejection::new().into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!resp.headers().contains_key(DEBUG_SIGN_TEXT_HEADER));
        assert!(!resp.headers().contains_key(DEBUG_QUERY_HEADER));
    }

    #[test]
    fn test_debug_headers_encode_newlines() {
        let rejection = SignatureRejection {
            debug: Some(SignatureDebug {
                sign_text: "POST\n/v1\nnonce\n1\n\n".to_string(),
                query_string: "a=1&b=张三".to_string(),
            }),
        };
        let resp = rejection.into_response();
        assert_eq!(
            resp.headers()[DEBUG_SIGN_TEXT_HEADER],
            "POST%0A/v1%0Anonce%0A1%0A%0A"
        );
        assert_eq!(
            resp.headers()[DEBUG_QUERY_HEADER],
            "a=1&b=%E5%BC%A0%E4%B8%89"
        );
    }
}
