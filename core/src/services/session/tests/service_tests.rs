//! Unit tests for session issuance, validation and revocation

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::entities::token::{TokenKind, TOKEN_TYPE_BEARER};
use crate::errors::{DomainError, TokenError};
use crate::repositories::revocation::MockRevocationStore;
use crate::repositories::RevocationStore;
use crate::services::session::SessionManager;
use crate::services::token::{ManualClock, TokenServiceConfig};

fn create_test_manager() -> (SessionManager<MockRevocationStore>, MockRevocationStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = MockRevocationStore::with_clock(clock.clone());
    let manager = SessionManager::with_clock(
        store.clone(),
        TokenServiceConfig::new("session-test-secret"),
        clock.clone(),
    )
    .unwrap();
    (manager, store, clock)
}

#[tokio::test]
async fn test_issue_session_records_both_tokens() {
    let (manager, store, _) = create_test_manager();

    let pair = manager.issue_session(7, Some("seven@example.com")).await.unwrap();

    assert_eq!(pair.token_type, TOKEN_TYPE_BEARER);
    assert_eq!(pair.access_expires_in, 15 * 60);
    assert_eq!(pair.refresh_expires_in, 7 * 86400);
    assert_ne!(pair.access_token, pair.refresh_token);
    assert_eq!(store.live_entries().await, 2);

    let claims = manager.validate(&pair.access_token, TokenKind::Access).await.unwrap();
    assert_eq!(claims.subject_id, 7);
    assert_eq!(claims.email.as_deref(), Some("seven@example.com"));

    let claims = manager.validate(&pair.refresh_token, TokenKind::Refresh).await.unwrap();
    assert_eq!(claims.subject_id, 7);
}

#[tokio::test]
async fn test_validate_immediately_after_issue_for_many_subjects() {
    let (manager, _, _) = create_test_manager();

    for subject_id in [0, 1, 42, -5, i64::MAX] {
        let pair = manager.issue_session(subject_id, None).await.unwrap();
        let claims = manager.validate(&pair.access_token, TokenKind::Access).await.unwrap();
        assert_eq!(claims.subject_id, subject_id);
    }
}

#[tokio::test]
async fn test_kind_must_match() {
    let (manager, _, _) = create_test_manager();
    let pair = manager.issue_session(1, None).await.unwrap();

    assert_eq!(
        manager.validate(&pair.access_token, TokenKind::Refresh).await,
        Err(TokenError::Revoked)
    );
    assert_eq!(
        manager.validate(&pair.refresh_token, TokenKind::Access).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn test_expired_even_if_entry_still_present() {
    let (manager, store, clock) = create_test_manager();
    let pair = manager.issue_session(3, None).await.unwrap();

    // Keep the entry alive beyond the token's own expiry
    store
        .record(3, TokenKind::Access, &pair.access_token, 3600)
        .await
        .unwrap();
    clock.advance(Duration::minutes(16));

    assert_eq!(
        manager.validate(&pair.access_token, TokenKind::Access).await,
        Err(TokenError::Expired)
    );
}

#[tokio::test]
async fn test_unknown_but_validly_signed_token_is_revoked() {
    let (manager, _, _) = create_test_manager();
    let subject = crate::domain::entities::token::Subject::new(9, None);
    let token = manager.codec().encode(&subject, Duration::minutes(5)).unwrap();

    assert_eq!(
        manager.validate(&token, TokenKind::Access).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn test_decode_failures_skip_the_store() {
    let (manager, store, _) = create_test_manager();
    store.set_unavailable(true);

    // Malformed input is rejected locally, before any store round trip
    assert_eq!(
        manager.validate("garbage", TokenKind::Access).await,
        Err(TokenError::Malformed)
    );
}

#[tokio::test]
async fn test_store_unavailable_rejects_validation() {
    let (manager, store, _) = create_test_manager();
    let pair = manager.issue_session(11, None).await.unwrap();

    store.set_unavailable(true);
    let result = manager.validate(&pair.access_token, TokenKind::Access).await;

    assert!(matches!(result, Err(TokenError::StoreUnavailable { .. })));
    assert!(result.unwrap_err().is_retriable());
}

#[tokio::test]
async fn test_issue_fails_when_store_unavailable() {
    let (manager, store, _) = create_test_manager();
    store.set_unavailable(true);

    let result = manager.issue_session(1, None).await;
    assert!(matches!(result, Err(TokenError::IssuanceFailed { .. })));
}

#[tokio::test]
async fn test_partial_issuance_is_rolled_back() {
    let (manager, store, _) = create_test_manager();
    store.fail_records_of(Some(TokenKind::Refresh));

    let result = manager.issue_session(1, None).await;

    assert!(matches!(result, Err(TokenError::IssuanceFailed { .. })));
    assert_eq!(store.live_entries().await, 0);
}

#[tokio::test]
async fn test_partial_issuance_of_access_is_rolled_back() {
    let (manager, store, _) = create_test_manager();
    store.fail_records_of(Some(TokenKind::Access));

    assert!(manager.issue_session(1, None).await.is_err());
    assert_eq!(store.live_entries().await, 0);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let (manager, _, _) = create_test_manager();
    let pair = manager.issue_session(1, None).await.unwrap();

    assert_eq!(manager.refresh(&pair.access_token).await, Err(TokenError::Revoked));
}

#[tokio::test]
async fn test_refresh_checks_the_store() {
    let (manager, store, _) = create_test_manager();
    let pair = manager.issue_session(1, None).await.unwrap();

    store.revoke(1, TokenKind::Refresh, &pair.refresh_token).await.unwrap();

    assert_eq!(manager.refresh(&pair.refresh_token).await, Err(TokenError::Revoked));
}

#[tokio::test]
async fn test_refresh_fails_when_access_write_fails() {
    let (manager, store, _) = create_test_manager();
    let pair = manager.issue_session(1, None).await.unwrap();
    store.fail_records_of(Some(TokenKind::Access));

    assert!(matches!(
        manager.refresh(&pair.refresh_token).await,
        Err(TokenError::IssuanceFailed { .. })
    ));
}

#[tokio::test]
async fn test_refresh_keeps_old_access_token_valid() {
    let (manager, _, _) = create_test_manager();
    let pair = manager.issue_session(5, Some("five@example.com")).await.unwrap();

    let refreshed = manager.refresh(&pair.refresh_token).await.unwrap();

    assert_eq!(refreshed.token_type, TOKEN_TYPE_BEARER);
    assert_eq!(refreshed.expires_in, 900);
    assert_ne!(refreshed.access_token, pair.access_token);
    let claims = manager.validate(&refreshed.access_token, TokenKind::Access).await.unwrap();
    assert_eq!(claims.email.as_deref(), Some("five@example.com"));
    // Prior access tokens are not revoked by a refresh
    assert!(manager.validate(&pair.access_token, TokenKind::Access).await.is_ok());
    // Nor is the refresh token rotated
    assert!(manager.validate(&pair.refresh_token, TokenKind::Refresh).await.is_ok());
}

#[tokio::test]
async fn test_invalidate_subject_revokes_everything() {
    let (manager, _, _) = create_test_manager();
    let first = manager.issue_session(8, None).await.unwrap();
    let second = manager.issue_session(8, None).await.unwrap();
    let refreshed = manager.refresh(&first.refresh_token).await.unwrap();
    let other = manager.issue_session(80, None).await.unwrap();

    let removed = manager.invalidate_subject(8).await.unwrap();
    assert_eq!(removed, 5);

    for (token, kind) in [
        (&first.access_token, TokenKind::Access),
        (&first.refresh_token, TokenKind::Refresh),
        (&second.access_token, TokenKind::Access),
        (&second.refresh_token, TokenKind::Refresh),
        (&refreshed.access_token, TokenKind::Access),
    ] {
        assert_eq!(manager.validate(token, kind).await, Err(TokenError::Revoked));
    }
    assert!(manager.validate(&other.access_token, TokenKind::Access).await.is_ok());
    assert_eq!(manager.refresh(&first.refresh_token).await, Err(TokenError::Revoked));
}

#[tokio::test]
async fn test_invalidate_subject_store_unavailable() {
    let (manager, store, _) = create_test_manager();
    store.set_unavailable(true);

    assert!(matches!(
        manager.invalidate_subject(1).await,
        Err(TokenError::StoreUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_revoke_single_token() {
    let (manager, _, _) = create_test_manager();
    let pair = manager.issue_session(4, None).await.unwrap();

    assert!(manager.revoke(&pair.access_token, TokenKind::Access).await.unwrap());
    assert!(!manager.revoke(&pair.access_token, TokenKind::Access).await.unwrap());

    assert_eq!(
        manager.validate(&pair.access_token, TokenKind::Access).await,
        Err(TokenError::Revoked)
    );
    assert!(manager.validate(&pair.refresh_token, TokenKind::Refresh).await.is_ok());
}

#[tokio::test]
async fn test_revoke_rejects_forged_token() {
    let (manager, _, _) = create_test_manager();
    assert_eq!(
        manager.revoke("not.a.token", TokenKind::Access).await,
        Err(TokenError::Malformed)
    );
}

#[tokio::test]
async fn test_authenticate_with_bearer_header() {
    let (manager, _, _) = create_test_manager();
    let pair = manager.issue_session(21, None).await.unwrap();
    let header = format!("Bearer {}", pair.access_token);

    let claims = manager.authenticate(Some(&header)).await.unwrap();
    assert_eq!(claims.subject_id, 21);

    assert_eq!(manager.authenticate(None).await, Err(TokenError::Malformed));
    assert_eq!(
        manager.authenticate(Some(&format!("Basic {}", pair.access_token))).await,
        Err(TokenError::Malformed)
    );

    let refresh_header = format!("Bearer {}", pair.refresh_token);
    assert_eq!(
        manager.authenticate(Some(&refresh_header)).await,
        Err(TokenError::Revoked)
    );
}

#[tokio::test]
async fn test_construction_rejects_bad_config() {
    let result = SessionManager::new(MockRevocationStore::new(), TokenServiceConfig::new(""));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_construction_rejects_unrepresentable_lifetime() {
    let mut config = TokenServiceConfig::new("session-test-secret");
    config.refresh_token_expiry_days = 100_000_000;

    let result = SessionManager::new(MockRevocationStore::new(), config);
    assert!(matches!(result, Err(DomainError::Configuration { .. })));
}
