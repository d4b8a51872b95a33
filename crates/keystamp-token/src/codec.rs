//! RS256 token encoding and decoding
//!
//! Tokens are standard JWTs. The exact expiry instant `now + ttl` travels in
//! the millisecond `exp_ms` claim, which becomes
//! [`AuthenticationToken::expire_time`]; a token is expired once
//! `exp_ms <= now`. The registered `exp` claim is `exp_ms` rounded up to whole
//! seconds for generic JWT consumers.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::{Algorithm, Header, Validation};
use keystamp_core::{SharedClock, SystemClock, random_alphanumeric};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::{TokenError, TokenResult};
use crate::keys::TokenKeyPair;
use crate::types::{AuthenticationToken, AuthenticationUser, TokenKind};

/// Claim carrying the embedded [`AuthenticationUser`]
pub const USER_CLAIM: &str = "user";

const JTI_ENTROPY_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    iss: String,
    aud: String,
    sub: String,
    exp: i64,
    exp_ms: i64,
    iat: i64,
    jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<AuthenticationUser>,
}

/// Encodes and parses access and refresh tokens
#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
    keys: TokenKeyPair,
    validation: Validation,
    clock: SharedClock,
}

impl TokenCodec {
    /// Create a codec
    pub fn new(config: TokenConfig, keys: TokenKeyPair) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        // Expiry is checked against the injected clock at millisecond precision
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            config,
            keys,
            validation,
            clock: SystemClock::shared(),
        }
    }

    /// Replace the clock used for issuing and expiry checks
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Current time in epoch milliseconds, per the codec's clock
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Encode an access token for `user`
    ///
    /// `ttl` defaults to the configured access token lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn encode(
        &self,
        user: &AuthenticationUser,
        ttl: Option<Duration>,
    ) -> TokenResult<AuthenticationToken> {
        let ttl = ttl.unwrap_or_else(|| self.config.access_ttl());
        self.issue(&user.id, Some(user.clone()), ttl)
    }

    /// Encode a refresh token for `user_id`
    ///
    /// `ttl` defaults to the configured refresh token lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn encode_refresh_token(
        &self,
        user_id: &str,
        ttl: Option<Duration>,
    ) -> TokenResult<AuthenticationToken> {
        let ttl = ttl.unwrap_or_else(|| self.config.refresh_ttl());
        self.issue(user_id, None, ttl)
    }

    /// Parse and check an access token
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] past expiry and
    /// [`TokenError::InvalidToken`] for any other failure, including a
    /// missing user claim.
    pub fn parse(&self, token_value: &str) -> TokenResult<AuthenticationToken> {
        self.decode(token_value, TokenKind::Access, true)
    }

    /// Parse and check a refresh token
    ///
    /// # Errors
    ///
    /// As [`TokenCodec::parse`]; a token carrying a user claim is rejected.
    pub fn parse_refresh_token(&self, token_value: &str) -> TokenResult<AuthenticationToken> {
        self.decode(token_value, TokenKind::Refresh, true)
    }

    /// Verify signature and claims but skip the expiry check
    ///
    /// Used to unbind tokens that may already be expired.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] if the token is malformed, forged
    /// or of the wrong kind.
    pub fn decode_ignoring_expiry(
        &self,
        token_value: &str,
        kind: TokenKind,
    ) -> TokenResult<AuthenticationToken> {
        self.decode(token_value, kind, false)
    }

    fn issue(
        &self,
        subject: &str,
        user: Option<AuthenticationUser>,
        ttl: Duration,
    ) -> TokenResult<AuthenticationToken> {
        let now = self.clock.now_millis();
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expire_time = now.saturating_add(ttl_millis);

        let claims = TokenClaims {
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            sub: subject.to_string(),
            exp: ceil_seconds(expire_time),
            exp_ms: expire_time,
            iat: now.div_euclid(1000),
            jti: token_id(now, subject),
            user,
        };

        let token_value = jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            self.keys.encoding(),
        )
        .map_err(|e| TokenError::Serialization(format!("failed to sign token: {e}")))?;

        Ok(AuthenticationToken {
            id: claims.jti,
            token_value,
            subject: claims.sub,
            user: claims.user,
            expire_time,
        })
    }

    fn decode(
        &self,
        token_value: &str,
        kind: TokenKind,
        check_expiry: bool,
    ) -> TokenResult<AuthenticationToken> {
        let data =
            jsonwebtoken::decode::<TokenClaims>(token_value, self.keys.decoding(), &self.validation)
                .map_err(|e| {
                    debug!(error = %e, "Token decoding failed");
                    TokenError::InvalidToken(e.to_string())
                })?;
        let claims = data.claims;

        match (kind, &claims.user) {
            (TokenKind::Access, None) => {
                return Err(TokenError::InvalidToken(format!(
                    "missing {USER_CLAIM} claim"
                )));
            }
            (TokenKind::Refresh, Some(_)) => {
                return Err(TokenError::InvalidToken(
                    "access token presented as refresh token".to_string(),
                ));
            }
            _ => {}
        }

        let expire_time = claims.exp_ms;
        if check_expiry && expire_time <= self.clock.now_millis() {
            debug!(jti = %claims.jti, expire_time, "Token expired");
            return Err(TokenError::Expired);
        }

        Ok(AuthenticationToken {
            id: claims.jti,
            token_value: token_value.to_string(),
            subject: claims.sub,
            user: claims.user,
            expire_time,
        })
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

fn ceil_seconds(millis: i64) -> i64 {
    let seconds = millis.div_euclid(1000);
    if millis.rem_euclid(1000) == 0 {
        seconds
    } else {
        seconds.saturating_add(1)
    }
}

/// `hex(sha256("<random>@<now_millis>#<subject>"))`
fn token_id(now_millis: i64, subject: &str) -> String {
    let seed = format!(
        "{}@{now_millis}#{subject}",
        random_alphanumeric(JTI_ENTROPY_LENGTH)
    );
    hex::encode(Sha256::digest(seed.as_bytes()))
}
