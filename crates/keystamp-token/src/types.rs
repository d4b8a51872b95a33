//! Token value types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Authenticated principal embedded in access tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationUser {
    /// Stable user id; becomes the token subject
    pub id: String,
    /// Display or login name
    pub user_name: String,
    /// Free-form attributes (roles, tenant, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl AuthenticationUser {
    /// Create a user without attributes
    pub fn new(id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Issued or decoded token
///
/// Never mutated once created. Its lifetime ends at `expire_time` or when
/// the binding for `id` is removed, whichever comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationToken {
    /// Token id (`jti`), also the binding key
    pub id: String,
    /// Encoded wire form
    pub token_value: String,
    /// User id the token was issued for
    pub subject: String,
    /// Embedded user, absent for refresh tokens
    pub user: Option<AuthenticationUser>,
    /// Expiry in epoch milliseconds
    pub expire_time: i64,
}

impl AuthenticationToken {
    /// Whether this is a refresh token
    pub fn is_refresh(&self) -> bool {
        self.user.is_none()
    }
}

/// Token flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Carries the user claim
    Access,
    /// Subject only
    Refresh,
}

impl TokenKind {
    /// Rejection message when a token of this kind has no live binding
    pub fn unauthorized_message(self) -> &'static str {
        match self {
            Self::Access => "invalid access token",
            Self::Refresh => "invalid refresh token",
        }
    }
}
