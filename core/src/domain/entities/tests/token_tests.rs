use chrono::{Duration, TimeZone, Utc};

use crate::domain::entities::token::{AccessToken, Claims, TokenKind, TokenPair, TOKEN_TYPE_BEARER};

fn sample_claims() -> Claims {
    let issued_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    Claims {
        subject_id: 42,
        email: Some("a@b.com".to_string()),
        issued_at,
        expires_at: issued_at + Duration::minutes(15),
        token_id: "jti-1".to_string(),
    }
}

#[test]
fn test_token_kind_names() {
    assert_eq!(TokenKind::Access.as_str(), "access");
    assert_eq!(TokenKind::Refresh.to_string(), "refresh");
    assert_eq!("access".parse::<TokenKind>().unwrap(), TokenKind::Access);
    assert_eq!("refresh".parse::<TokenKind>().unwrap(), TokenKind::Refresh);
    assert!("Access".parse::<TokenKind>().is_err());
}

#[test]
fn test_claims_expiry_boundary() {
    let claims = sample_claims();

    assert!(!claims.is_expired_at(claims.issued_at));
    assert!(!claims.is_expired_at(claims.expires_at - Duration::seconds(1)));
    assert!(claims.is_expired_at(claims.expires_at));
    assert!(claims.is_expired_at(claims.expires_at + Duration::minutes(1)));
}

#[test]
fn test_claims_remaining_seconds() {
    let claims = sample_claims();

    assert_eq!(claims.remaining_seconds(claims.issued_at), 900);
    assert_eq!(claims.remaining_seconds(claims.expires_at + Duration::hours(1)), 0);
}

#[test]
fn test_claims_subject() {
    let subject = sample_claims().subject();
    assert_eq!(subject.id, 42);
    assert_eq!(subject.email.as_deref(), Some("a@b.com"));
}

#[test]
fn test_token_pair_is_bearer() {
    let pair = TokenPair::new("access".to_string(), "refresh".to_string(), 900, 604800);

    assert_eq!(pair.token_type, TOKEN_TYPE_BEARER);
    assert_eq!(pair.access_expires_in, 900);
    assert_eq!(pair.refresh_expires_in, 604800);

    let json = serde_json::to_value(&pair).unwrap();
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["access_token"], "access");
}

#[test]
fn test_access_token_response_shape() {
    let token = AccessToken::new("abc".to_string(), 900);
    let json = serde_json::to_value(&token).unwrap();

    assert_eq!(json["access_token"], "abc");
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["expires_in"], 900);
}
