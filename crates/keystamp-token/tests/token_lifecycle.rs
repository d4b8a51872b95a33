//! Token lifecycle integration tests
//!
//! Tests cover:
//! - Issue then validate
//! - Revocation by subject and by token value
//! - Natural expiry with the system clock
//! - Refresh token flow
//! - jti uniqueness

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use keystamp_token::{
    AuthenticationTokenService, AuthenticationUser, MemoryTokenBindingStore, TokenCodec,
    TokenConfig, TokenError, TokenKeyPair,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn keys() -> TokenKeyPair {
    static KEYS: OnceLock<TokenKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| TokenKeyPair::generate(2048).expect("key generation"))
        .clone()
}

fn service() -> AuthenticationTokenService {
    let config = TokenConfig::default().issued_by("auth.example.com", "api.example.com");
    AuthenticationTokenService::new(
        TokenCodec::new(config, keys()),
        Arc::new(MemoryTokenBindingStore::new()),
    )
}

fn alice() -> AuthenticationUser {
    AuthenticationUser::new("1001", "alice").with_attribute("roles", json!(["admin"]))
}

#[tokio::test]
async fn test_generate_then_validate() {
    let service = service();

    let token = service.generate_token(&alice(), None).await.unwrap();
    let validated = service
        .parse_and_validate_token(&token.token_value)
        .await
        .unwrap();

    assert_eq!(validated.id, token.id);
    assert_eq!(validated.subject, "1001");
    assert_eq!(validated.user, Some(alice()));
}

#[tokio::test]
async fn test_revoke_all_invalidates_cryptographically_valid_token() {
    // GIVEN: an issued, validated token
    let service = service();
    let token = service.generate_token(&alice(), None).await.unwrap();
    assert!(service.parse_and_validate_token(&token.token_value).await.is_ok());

    // WHEN: all tokens for the user are revoked
    let revoked = service.revoke_all_token("1001").await.unwrap();
    assert_eq!(revoked, 1);

    // THEN: validation fails, while the codec alone still accepts the JWT
    assert_eq!(
        service.parse_and_validate_token(&token.token_value).await,
        Err(TokenError::Unauthorized("invalid access token".to_string()))
    );
    assert!(service.codec().parse(&token.token_value).is_ok());
}

#[tokio::test]
async fn test_revoke_single_access_token() {
    let service = service();
    let kept = service.generate_token(&alice(), None).await.unwrap();
    let revoked = service.generate_token(&alice(), None).await.unwrap();

    service
        .revoke_access_token(&revoked.token_value)
        .await
        .unwrap();

    assert!(service.parse_and_validate_token(&kept.token_value).await.is_ok());
    assert!(
        service
            .parse_and_validate_token(&revoked.token_value)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_short_ttl_token_expires() {
    let service = service();
    let token = service
        .generate_token(&alice(), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    assert!(service.parse_and_validate_token(&token.token_value).await.is_ok());

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(
        service.parse_and_validate_token(&token.token_value).await,
        Err(TokenError::Expired)
    );
}

#[tokio::test]
async fn test_expired_token_can_still_be_revoked() {
    let service = service();
    let token = service
        .generate_token(&alice(), Some(Duration::from_millis(100)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(service.revoke_access_token(&token.token_value).await.is_ok());
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let service = service();
    let refresh = service.generate_refresh_token("1001", None).await.unwrap();
    assert!(refresh.user.is_none());

    let validated = service
        .parse_and_validate_refresh_token(&refresh.token_value)
        .await
        .unwrap();
    assert_eq!(validated.subject, "1001");

    service
        .revoke_refresh_token(&refresh.token_value)
        .await
        .unwrap();
    assert_eq!(
        service
            .parse_and_validate_refresh_token(&refresh.token_value)
            .await,
        Err(TokenError::Unauthorized("invalid refresh token".to_string()))
    );
}

#[tokio::test]
async fn test_refresh_and_access_tokens_are_not_interchangeable() {
    let service = service();
    let access = service.generate_token(&alice(), None).await.unwrap();
    let refresh = service.generate_refresh_token("1001", None).await.unwrap();

    assert!(matches!(
        service.parse_and_validate_refresh_token(&access.token_value).await,
        Err(TokenError::InvalidToken(_))
    ));
    assert!(matches!(
        service.parse_and_validate_token(&refresh.token_value).await,
        Err(TokenError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn test_token_ids_are_unique() {
    let service = service();
    let first = service.generate_token(&alice(), None).await.unwrap();
    let second = service.generate_token(&alice(), None).await.unwrap();
    assert_ne!(first.id, second.id);
}
