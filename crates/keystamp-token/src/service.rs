//! Token issuance, validation and revocation
//!
//! [`AuthenticationTokenService`] pairs a [`TokenCodec`] with a
//! [`TokenBindingStore`]. A token is usable only while its signature verifies,
//! it has not expired, and a binding for its id names the same subject.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::binding::TokenBindingStore;
use crate::codec::TokenCodec;
use crate::error::{TokenError, TokenResult};
use crate::types::{AuthenticationToken, AuthenticationUser, TokenKind};

/// Session token service
#[derive(Debug, Clone)]
pub struct AuthenticationTokenService {
    codec: TokenCodec,
    bindings: Arc<dyn TokenBindingStore>,
}

impl AuthenticationTokenService {
    /// Create a service
    pub fn new(codec: TokenCodec, bindings: Arc<dyn TokenBindingStore>) -> Self {
        Self { codec, bindings }
    }

    /// Underlying codec
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue an access token and bind it
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the binding write fails.
    pub async fn generate_token(
        &self,
        user: &AuthenticationUser,
        ttl: Option<Duration>,
    ) -> TokenResult<AuthenticationToken> {
        let token = self.codec.encode(user, ttl)?;
        self.bind(&token).await?;
        info!(subject = %token.subject, jti = %token.id, "Issued access token");
        Ok(token)
    }

    /// Issue a refresh token and bind it
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the binding write fails.
    pub async fn generate_refresh_token(
        &self,
        user_id: &str,
        ttl: Option<Duration>,
    ) -> TokenResult<AuthenticationToken> {
        let token = self.codec.encode_refresh_token(user_id, ttl)?;
        self.bind(&token).await?;
        info!(subject = %token.subject, jti = %token.id, "Issued refresh token");
        Ok(token)
    }

    /// Parse an access token and require a live binding
    ///
    /// # Errors
    ///
    /// [`TokenError::Expired`] past expiry, `Unauthorized("invalid access
    /// token")` without a matching binding, [`TokenError::InvalidToken`] for
    /// malformed tokens.
    pub async fn parse_and_validate_token(
        &self,
        token_value: &str,
    ) -> TokenResult<AuthenticationToken> {
        let token = self.codec.parse(token_value)?;
        self.check_binding(token, TokenKind::Access).await
    }

    /// Parse a refresh token and require a live binding
    ///
    /// # Errors
    ///
    /// As [`Self::parse_and_validate_token`], with "invalid refresh token".
    pub async fn parse_and_validate_refresh_token(
        &self,
        token_value: &str,
    ) -> TokenResult<AuthenticationToken> {
        let token = self.codec.parse_refresh_token(token_value)?;
        self.check_binding(token, TokenKind::Refresh).await
    }

    /// Revoke every token issued for `user_id`
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Store`] if the binding store fails.
    pub async fn revoke_all_token(&self, user_id: &str) -> TokenResult<usize> {
        let revoked = self.bindings.remove_subject(user_id).await?;
        info!(subject = user_id, revoked, "Revoked all tokens");
        Ok(revoked)
    }

    /// Revoke one access token
    ///
    /// Expired tokens are accepted so their bindings can still be removed.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] if the value is not an access
    /// token issued by this codec.
    pub async fn revoke_access_token(&self, token_value: &str) -> TokenResult<()> {
        self.revoke(token_value, TokenKind::Access).await
    }

    /// Revoke one refresh token
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] if the value is not a refresh
    /// token issued by this codec.
    pub async fn revoke_refresh_token(&self, token_value: &str) -> TokenResult<()> {
        self.revoke(token_value, TokenKind::Refresh).await
    }

    async fn revoke(&self, token_value: &str, kind: TokenKind) -> TokenResult<()> {
        let token = self.codec.decode_ignoring_expiry(token_value, kind)?;
        self.bindings.remove(&token.id).await?;
        info!(subject = %token.subject, jti = %token.id, ?kind, "Revoked token");
        Ok(())
    }

    async fn bind(&self, token: &AuthenticationToken) -> TokenResult<()> {
        let remaining = token.expire_time.saturating_sub(self.codec.now_millis()).max(0);
        let ttl = Duration::from_millis(u64::try_from(remaining).unwrap_or_default());
        self.bindings.put(&token.id, &token.subject, ttl).await
    }

    async fn check_binding(
        &self,
        token: AuthenticationToken,
        kind: TokenKind,
    ) -> TokenResult<AuthenticationToken> {
        match self.bindings.get(&token.id).await? {
            Some(subject) if subject == token.subject => Ok(token),
            bound => {
                debug!(
                    jti = %token.id,
                    subject = %token.subject,
                    bound = ?bound,
                    "Token has no matching binding"
                );
                Err(TokenError::Unauthorized(
                    kind.unauthorized_message().to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::MemoryTokenBindingStore;
    use crate::config::TokenConfig;
    use crate::keys::TokenKeyPair;
    use std::sync::OnceLock;

    fn keys() -> TokenKeyPair {
        static KEYS: OnceLock<TokenKeyPair> = OnceLock::new();
        KEYS.get_or_init(|| TokenKeyPair::generate(2048).expect("key generation"))
            .clone()
    }

    fn service() -> (AuthenticationTokenService, Arc<MemoryTokenBindingStore>) {
        let store = Arc::new(MemoryTokenBindingStore::new());
        let codec = TokenCodec::new(TokenConfig::default(), keys());
        (AuthenticationTokenService::new(codec, store.clone()), store)
    }

    #[tokio::test]
    async fn test_sub_second_token_is_bound_and_valid_at_issue() {
        let clock = Arc::new(keystamp_core::ManualClock::new(1_700_000_000_250));
        let store = Arc::new(MemoryTokenBindingStore::new());
        let codec = TokenCodec::new(TokenConfig::default(), keys()).with_clock(clock);
        let service = AuthenticationTokenService::new(codec, store.clone());

        let token = service
            .generate_token(
                &AuthenticationUser::new("42", "alice"),
                Some(Duration::from_millis(100)),
            )
            .await
            .unwrap();

        assert_eq!(token.expire_time, 1_700_000_000_350);
        assert_eq!(store.get(&token.id).await.unwrap().as_deref(), Some("42"));
        assert!(
            service
                .parse_and_validate_token(&token.token_value)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_generate_binds_token() {
        let (service, store) = service();
        let token = service
            .generate_token(&AuthenticationUser::new("42", "alice"), None)
            .await
            .unwrap();
        assert_eq!(store.get(&token.id).await.unwrap().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_binding_for_other_subject_is_unauthorized() {
        let (service, store) = service();
        let token = service
            .generate_token(&AuthenticationUser::new("42", "alice"), None)
            .await
            .unwrap();
        store
            .put(&token.id, "43", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            service.parse_and_validate_token(&token.token_value).await,
            Err(TokenError::Unauthorized("invalid access token".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unbound_refresh_token_is_unauthorized() {
        let (service, _) = service();
        let token = service.codec().encode_refresh_token("42", None).unwrap();
        assert_eq!(
            service
                .parse_and_validate_refresh_token(&token.token_value)
                .await,
            Err(TokenError::Unauthorized("invalid refresh token".to_string()))
        );
    }
}
