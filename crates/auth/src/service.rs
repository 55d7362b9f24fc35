use crate::credentials::AdminCredentials;
use crate::error::{AuthError, Result};
use crate::token::{generate_session_token, hash_token};
use chrono::{Duration, Utc};
use cyt_database::SessionStore;
use cyt_models::{
    AdminSession, LoginRequest, LoginResponse, LogoutRequest, NewAdminSession, VerifyRequest,
};
use validator::Validate;

const LOGIN_FIELDS_REQUIRED: &str = "Usuario, contraseña y Device ID requeridos";
const VERIFY_FIELDS_REQUIRED: &str = "Device ID y token requeridos";
const DEVICE_ID_REQUIRED: &str = "Device ID requerido";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub credentials: AdminCredentials,
    pub session_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credentials: AdminCredentials::new("admin", "cieloytierra2024"),
            session_ttl: Duration::days(30),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "cieloytierra2024".to_string());

        let ttl_days = std::env::var("ADMIN_SESSION_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|days: &i64| *days > 0)
            .unwrap_or(30);

        Self {
            credentials: AdminCredentials::new(username, password),
            session_ttl: Duration::days(ttl_days),
        }
    }
}

/// Enforces the single-active-admin-session rule.
///
/// Holds no session state of its own; every decision is read from or
/// written to the store, so any number of instances can share one store.
pub struct AdminSessionService<S> {
    store: S,
    credentials: AdminCredentials,
    session_ttl: Duration,
}

impl<S: SessionStore> AdminSessionService<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            store,
            credentials: config.credentials,
            session_ttl: config.session_ttl,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check credentials and make the caller the only logged-in admin.
    ///
    /// Every other session, including an older one for the same device, is
    /// invalidated.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        request
            .validate()
            .map_err(|_| AuthError::validation(LOGIN_FIELDS_REQUIRED))?;

        let (username, password, device_id) = match (
            request.username.as_deref(),
            request.password.as_deref(),
            request.device_id.as_deref(),
        ) {
            (Some(u), Some(p), Some(d)) => (u, p, d),
            _ => return Err(AuthError::validation(LOGIN_FIELDS_REQUIRED)),
        };

        if !self.credentials.matches(username, password) {
            tracing::warn!(device_id, "Admin login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_session_token();
        let new_session = NewAdminSession {
            device_id: device_id.to_string(),
            token_hash: hash_token(&token),
            expires_at: Utc::now() + self.session_ttl,
        };

        let created = self.store.create_exclusive(&new_session).await?;

        tracing::info!(
            device_id,
            evicted = created.evicted,
            expires_at = %created.session.expires_at,
            "Admin session created"
        );

        Ok(LoginResponse {
            success: true,
            token,
            device_id: created.session.device_id,
        })
    }

    /// Whether `(device_id, token)` is the current, unexpired session.
    ///
    /// Read-only; safe to poll.
    pub async fn verify(&self, request: &VerifyRequest) -> Result<bool> {
        let (device_id, token) = Self::verify_fields(request)?;
        Ok(self.current_session(device_id, token).await?.is_some())
    }

    /// The session row behind a valid `(device_id, token)` pair.
    pub async fn current_session(&self, device_id: &str, token: &str) -> Result<Option<AdminSession>> {
        let session = self.store.find_valid(device_id, &hash_token(token)).await?;
        if session.is_none() {
            tracing::debug!(device_id, "Admin session not valid");
        }
        Ok(session)
    }

    /// Drop the session owned by the device. Succeeds when there is none.
    pub async fn logout(&self, request: &LogoutRequest) -> Result<()> {
        request
            .validate()
            .map_err(|_| AuthError::validation(DEVICE_ID_REQUIRED))?;
        let device_id = request
            .device_id
            .as_deref()
            .ok_or_else(|| AuthError::validation(DEVICE_ID_REQUIRED))?;

        let removed = self.store.delete_by_device(device_id).await?;
        tracing::info!(device_id, removed, "Admin session logout");

        Ok(())
    }

    /// Informational check used before a device has logged in itself.
    pub async fn has_active_session(&self, exclude_device_id: Option<&str>) -> Result<bool> {
        Ok(self.store.has_active(exclude_device_id).await?)
    }

    /// Remove every session. Operator action; not exposed over HTTP.
    pub async fn revoke_all(&self) -> Result<u64> {
        let removed = self.store.delete_all().await?;
        tracing::warn!(removed, "All admin sessions revoked");
        Ok(removed)
    }

    pub async fn cleanup_expired(&self) -> Result<u64> {
        Ok(self.store.cleanup_expired().await?)
    }

    fn verify_fields(request: &VerifyRequest) -> Result<(&str, &str)> {
        request
            .validate()
            .map_err(|_| AuthError::validation(VERIFY_FIELDS_REQUIRED))?;

        match (request.device_id.as_deref(), request.token.as_deref()) {
            (Some(device_id), Some(token)) => Ok((device_id, token)),
            _ => Err(AuthError::validation(VERIFY_FIELDS_REQUIRED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyt_database::MemorySessionStore;

    fn service() -> AdminSessionService<MemorySessionStore> {
        AdminSessionService::new(MemorySessionStore::new(), SessionConfig::default())
    }

    #[tokio::test]
    async fn test_login_returns_hex_token_and_device() {
        let service = service();
        let response = service
            .login(&LoginRequest::new("admin", "cieloytierra2024", "dev-1"))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.device_id, "dev-1");
        assert_eq!(response.token.len(), 64);
    }

    #[tokio::test]
    async fn test_stored_row_holds_hash_not_token() {
        let service = service();
        let response = service
            .login(&LoginRequest::new("admin", "cieloytierra2024", "dev-1"))
            .await
            .unwrap();

        let row = service.store().current().await.unwrap();
        assert_ne!(row.token_hash, response.token);
        assert_eq!(row.token_hash, hash_token(&response.token));
    }

    #[tokio::test]
    async fn test_bad_credentials_do_not_touch_store() {
        let service = service();
        service
            .login(&LoginRequest::new("admin", "cieloytierra2024", "dev-1"))
            .await
            .unwrap();

        let err = service
            .login(&LoginRequest::new("admin", "wrong", "dev-2"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(service.store().current().await.unwrap().device_id, "dev-1");
    }

    #[tokio::test]
    async fn test_missing_device_id_is_validation_error() {
        let service = service();
        let request = LoginRequest {
            device_id: None,
            ..LoginRequest::new("admin", "cieloytierra2024", "")
        };

        let err = service.login(&request).await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_session_ttl_applied() {
        let config = SessionConfig {
            session_ttl: Duration::hours(1),
            ..SessionConfig::default()
        };
        let service = AdminSessionService::new(MemorySessionStore::new(), config);
        service
            .login(&LoginRequest::new("admin", "cieloytierra2024", "dev-1"))
            .await
            .unwrap();

        let row = service.store().current().await.unwrap();
        let remaining = row.expires_at - Utc::now();
        assert!(remaining <= Duration::hours(1));
        assert!(remaining > Duration::minutes(59));
    }

    #[tokio::test]
    async fn test_revoke_all() {
        let service = service();
        service
            .login(&LoginRequest::new("admin", "cieloytierra2024", "dev-1"))
            .await
            .unwrap();

        assert_eq!(service.revoke_all().await.unwrap(), 1);
        assert!(!service.has_active_session(None).await.unwrap());
    }
}
