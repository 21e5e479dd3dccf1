//! Unit tests for JWT functionality.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::Claims;
use crate::jwt::{JwtConfig, JwtError, JwtService};

fn create_test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_minutes: 15,
    })
}

#[test]
fn test_claims_new_sets_correct_fields() {
    let user_id = Uuid::new_v4();
    let expires_at = Utc::now() + Duration::hours(1);

    let claims = Claims::new(user_id, "MANAGER", expires_at);

    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.role, "MANAGER");
    assert!(claims.iat <= Utc::now().timestamp());
    assert_eq!(claims.exp, expires_at.timestamp());
    assert!(!claims.service);
}

#[test]
fn test_service_account_claims_are_admin() {
    let user_id = Uuid::new_v4();
    let claims = Claims::service_account(user_id);

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.role, "ADMIN");
    assert!(claims.service);
}

#[test]
fn test_generate_and_validate_token() {
    let service = create_test_service();
    let user_id = Uuid::new_v4();

    let token = service.generate_access_token(user_id, "FINANCE").unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.user_id(), user_id);
    assert_eq!(claims.role, "FINANCE");
    assert!(!claims.service);
}

#[test]
fn test_token_from_other_secret_is_rejected() {
    let service = create_test_service();
    let other = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        access_token_expires_minutes: 15,
    });

    let token = other
        .generate_access_token(Uuid::new_v4(), "EMPLOYEE")
        .unwrap();

    assert!(matches!(
        service.validate_token(&token),
        Err(JwtError::DecodingError(_))
    ));
}

#[test]
fn test_expired_token_is_reported_as_expired() {
    let service = JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        // Well past the default 60s leeway.
        access_token_expires_minutes: -10,
    });

    let token = service
        .generate_access_token(Uuid::new_v4(), "EMPLOYEE")
        .unwrap();

    assert!(matches!(
        service.validate_token(&token),
        Err(JwtError::Expired)
    ));
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    assert!(service.validate_token("invalid.token.here").is_err());
}

#[test]
fn test_expires_in_seconds() {
    assert_eq!(create_test_service().access_token_expires_in(), 900);
}
