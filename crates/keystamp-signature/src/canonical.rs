//! Canonical request construction
//!
//! Both sides of the protocol must serialize a request into byte-identical
//! text before signing. Two canonical forms exist:
//!
//! ```text
//! digest form (HMAC-SHA256):
//!   method=GET&requestPath=/v1/orders&nonce=N&timestamp=T[&queryStringMd5=..][&requestBodyMd5=..]
//!
//! raw-multiline form (SHA256-with-RSA):
//!   GET /v1/orders\n
//!   T\n
//!   N\n
//!   id=2&name=张三\n
//!   {"body":true}\n
//! ```
//!
//! The query string is canonicalized once, when the [`SignatureRequest`] is
//! built, so the raw query never reaches a signer.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use percent_encoding::percent_decode_str;

/// Content types whose body takes part in the signature
pub const SIGNED_BODY_CONTENT_TYPES: [&str; 2] =
    ["application/json", "application/x-www-form-urlencoded"];

/// Immutable set of signable request fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRequest {
    method: String,
    request_path: String,
    nonce: String,
    timestamp: String,
    query_string: Option<String>,
    request_body: Option<String>,
}

impl SignatureRequest {
    /// Build a request from raw fields
    ///
    /// `method` is upper-cased, `raw_query` is canonicalized and an empty body
    /// is treated as absent. Callers decide body participation beforehand with
    /// [`body_participates`].
    pub fn new(
        method: impl AsRef<str>,
        request_path: impl Into<String>,
        nonce: impl Into<String>,
        timestamp: impl Into<String>,
        raw_query: Option<&str>,
        request_body: Option<String>,
    ) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            request_path: request_path.into(),
            nonce: nonce.into(),
            timestamp: timestamp.into(),
            query_string: raw_query.and_then(canonical_query_string),
            request_body: request_body.filter(|body| !body.is_empty()),
        }
    }

    /// Upper-cased HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path without host or query
    pub fn request_path(&self) -> &str {
        &self.request_path
    }

    /// Client nonce
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Epoch milliseconds as sent by the client
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Canonical query string, `None` when the request had no query
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Signed body, `None` when the body does not participate
    pub fn request_body(&self) -> Option<&str> {
        self.request_body.as_deref()
    }

    /// Digest form used by HMAC-SHA256
    pub fn digest_form(&self) -> String {
        let mut text = format!(
            "method={}&requestPath={}&nonce={}&timestamp={}",
            self.method, self.request_path, self.nonce, self.timestamp
        );
        if let Some(query) = &self.query_string {
            let _ = write!(text, "&queryStringMd5={}", md5_hex(query));
        }
        if let Some(body) = &self.request_body {
            let _ = write!(text, "&requestBodyMd5={}", md5_hex(body));
        }
        text
    }

    /// Raw-multiline form used by SHA256-with-RSA
    pub fn multiline_form(&self) -> String {
        format!(
            "{} {}\n{}\n{}\n{}\n{}\n",
            self.method,
            self.request_path,
            self.timestamp,
            self.nonce,
            self.query_string.as_deref().unwrap_or_default(),
            self.request_body.as_deref().unwrap_or_default(),
        )
    }
}

/// Whether a body with this content type is part of the canonical text
///
/// Compares the media-type essence, so `application/json; charset=utf-8`
/// participates and a missing content type does not.
pub fn body_participates(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();
    SIGNED_BODY_CONTENT_TYPES
        .iter()
        .any(|signed| signed.eq_ignore_ascii_case(essence))
}

/// Canonicalize a raw query string
///
/// The whole query is form-decoded first, then split on `&` and on the first
/// `=` of each part. Keys are sorted by byte order; repeated keys keep every
/// value in their original order. A key without a value serializes as `key=`.
/// Returns `None` for an empty query.
pub fn canonical_query_string(raw: &str) -> Option<String> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }

    let plus_decoded = raw.replace('+', " ");
    let decoded = percent_decode_str(&plus_decoded).decode_utf8_lossy();

    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for part in decoded.split('&').filter(|part| !part.is_empty()) {
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        grouped.entry(key).or_default().push(value);
    }
    if grouped.is_empty() {
        return None;
    }

    let mut canonical = String::with_capacity(decoded.len());
    for (key, values) in &grouped {
        for value in values {
            if !canonical.is_empty() {
                canonical.push('&');
            }
            canonical.push_str(key);
            canonical.push('=');
            canonical.push_str(value);
        }
    }
    Some(canonical)
}

/// Lower-case hex MD5 digest
pub fn md5_hex(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}
