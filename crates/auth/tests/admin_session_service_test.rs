use chrono::{Duration, Utc};
use cyt_auth::{hash_token, AdminSessionService, AuthError, SessionConfig};
use cyt_database::{MemorySessionStore, SessionStore};
use cyt_models::{LoginRequest, LogoutRequest, NewAdminSession, VerifyRequest};
use std::sync::Arc;

const USERNAME: &str = "admin";
const PASSWORD: &str = "cieloytierra2024";

fn service() -> AdminSessionService<MemorySessionStore> {
    AdminSessionService::new(MemorySessionStore::new(), SessionConfig::default())
}

async fn login(service: &AdminSessionService<MemorySessionStore>, device_id: &str) -> String {
    service
        .login(&LoginRequest::new(USERNAME, PASSWORD, device_id))
        .await
        .expect("login should succeed")
        .token
}

async fn verify(
    service: &AdminSessionService<MemorySessionStore>,
    device_id: &str,
    token: &str,
) -> bool {
    service
        .verify(&VerifyRequest::new(device_id, token))
        .await
        .expect("verify should not fail")
}

#[tokio::test]
async fn test_verify_immediately_after_login() {
    let service = service();
    let token = login(&service, "dev-1").await;

    assert!(verify(&service, "dev-1", &token).await);
}

#[tokio::test]
async fn test_verify_rejects_mismatched_pairs() {
    let service = service();
    let token = login(&service, "dev-1").await;

    assert!(!verify(&service, "dev-1", "0".repeat(64).as_str()).await);
    assert!(!verify(&service, "dev-2", &token).await);
}

#[tokio::test]
async fn test_verify_rejects_expired_session() {
    let service = service();
    let token = "a".repeat(64);
    service
        .store()
        .create_exclusive(&NewAdminSession {
            device_id: "dev-1".to_string(),
            token_hash: hash_token(&token),
            expires_at: Utc::now() - Duration::seconds(1),
        })
        .await
        .unwrap();

    assert!(!verify(&service, "dev-1", &token).await);
}

#[tokio::test]
async fn test_second_device_evicts_first() {
    let service = service();
    let first = login(&service, "dev-1").await;
    let second = login(&service, "dev-2").await;

    assert!(!verify(&service, "dev-1", &first).await);
    assert!(verify(&service, "dev-2", &second).await);
}

#[tokio::test]
async fn test_relogin_on_same_device_invalidates_old_token() {
    let service = service();
    let old = login(&service, "dev-1").await;
    let new = login(&service, "dev-1").await;

    assert_ne!(old, new);
    assert!(!verify(&service, "dev-1", &old).await);
    assert!(verify(&service, "dev-1", &new).await);
}

#[tokio::test]
async fn test_sequential_logins_leave_last_session() {
    let service = service();
    let mut last = String::new();
    for i in 0..20 {
        last = login(&service, &format!("dev-{i}")).await;
    }

    assert_eq!(service.store().row_count().await, 1);
    assert!(verify(&service, "dev-19", &last).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_leave_exactly_one_valid_session() {
    let service = Arc::new(service());

    let mut handles = Vec::new();
    for i in 0..32 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let device_id = format!("dev-{i}");
            let token = login(&service, &device_id).await;
            (device_id, token)
        }));
    }

    let mut issued = Vec::new();
    for handle in handles {
        issued.push(handle.await.unwrap());
    }

    assert_eq!(service.store().row_count().await, 1);

    let mut valid = 0;
    for (device_id, token) in &issued {
        if verify(&service, device_id, token).await {
            valid += 1;
        }
    }
    assert_eq!(valid, 1);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let service = service();
    let token = login(&service, "dev-1").await;
    let request = LogoutRequest {
        device_id: Some("dev-1".to_string()),
    };

    service.logout(&request).await.unwrap();
    service.logout(&request).await.unwrap();

    assert!(!verify(&service, "dev-1", &token).await);
    assert!(!service.has_active_session(None).await.unwrap());
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let service = service();
    let request = LogoutRequest {
        device_id: Some("dev-1".to_string()),
    };

    assert!(service.logout(&request).await.is_ok());
}

#[tokio::test]
async fn test_logout_other_device_keeps_session() {
    let service = service();
    let token = login(&service, "dev-1").await;

    service
        .logout(&LogoutRequest {
            device_id: Some("dev-2".to_string()),
        })
        .await
        .unwrap();

    assert!(verify(&service, "dev-1", &token).await);
}

#[tokio::test]
async fn test_has_active_session_with_exclusion() {
    let service = service();
    assert!(!service.has_active_session(None).await.unwrap());

    login(&service, "dev-1").await;

    assert!(service.has_active_session(None).await.unwrap());
    assert!(service.has_active_session(Some("dev-2")).await.unwrap());
    assert!(!service.has_active_session(Some("dev-1")).await.unwrap());
}

#[tokio::test]
async fn test_validation_errors() {
    let service = service();

    let err = service
        .verify(&VerifyRequest {
            device_id: Some("dev-1".to_string()),
            token: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ValidationError(ref m) if m == "Device ID y token requeridos"));

    let err = service
        .logout(&LogoutRequest { device_id: None })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ValidationError(_)));

    let err = service
        .login(&LoginRequest {
            password: None,
            ..LoginRequest::new(USERNAME, PASSWORD, "dev-1")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ValidationError(_)));
}

#[tokio::test]
async fn test_wrong_password_is_authentication_error() {
    let service = service();
    let err = service
        .login(&LoginRequest::new(USERNAME, "wrong", "dev-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(err.to_string(), "Credenciales incorrectas");
    assert_eq!(service.store().row_count().await, 0);
}
