//! Unified error type

use http::StatusCode;
use keystamp_signature::SignatureError;
use keystamp_token::TokenError;

use crate::config::ConfigError;

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Any keystamp error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status for this error
    ///
    /// Signature rejections are `400`, token rejections `401`, everything
    /// else is a server fault.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Signature(e) if e.is_bad_request() => StatusCode::BAD_REQUEST,
            Self::Token(e) if e.is_client_error() => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Signature(e) => e.category(),
            Self::Token(e) => e.category(),
            Self::Config(_) => "configuration",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(feature = "middleware")]
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let (error, description) = match status {
            StatusCode::BAD_REQUEST => ("bad_request", self.to_string()),
            StatusCode::UNAUTHORIZED => ("invalid_token", self.to_string()),
            _ => {
                tracing::error!(error = %self, category = self.category(), "Internal error");
                ("server_error", "internal error".to_string())
            }
        };
        let body = serde_json::json!({
            "error": error,
            "error_description": description,
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                Error::from(SignatureError::bad_request("skew")),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(SignatureError::Configuration("prefix".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::from(TokenError::Expired), StatusCode::UNAUTHORIZED),
            (
                Error::from(TokenError::Unauthorized("invalid access token".into())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                Error::from(TokenError::InvalidToken("bad".into())),
                StatusCode::UNAUTHORIZED,
            ),
            (
                Error::from(TokenError::Store("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::from(ConfigError::UnsupportedFormat),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_signature_rejection_stays_generic() {
        let error = Error::from(SignatureError::bad_request("nonce replayed"));
        assert_eq!(error.to_string(), "sign verify error");
        assert_eq!(error.category(), "bad_request");
    }

    #[cfg(feature = "middleware")]
    #[test]
    fn test_into_response_hides_internal_details() {
        use axum::response::IntoResponse;

        let response = Error::from(TokenError::Store("redis down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
