use crate::handlers::{auth_error_response, ApiError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use cyt_database::SessionStore;
use cyt_models::ErrorResponse;
use std::sync::Arc;

pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// The verified admin session, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub device_id: String,
    pub expires_at: DateTime<Utc>,
}

fn unauthorized(message: &str) -> ApiError {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message)))
}

/// Pull `(device_id, token)` from `X-Device-Id` and `Authorization: Bearer`.
pub fn extract_session_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
    let device_id = headers
        .get(DEVICE_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| unauthorized("Device ID requerido"))?;

    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("Token requerido"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Token requerido"))?;

    Ok((device_id.to_string(), token.to_string()))
}

/// Middleware to require the current admin session.
///
/// Anything other than the one valid `(device_id, token)` pair gets 401,
/// which is how an evicted dashboard learns it lost its session.
pub async fn require_admin_session<S: SessionStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (device_id, token) = extract_session_credentials(&headers)?;

    let session = state
        .sessions
        .current_session(&device_id, &token)
        .await
        .map_err(auth_error_response)?
        .ok_or_else(|| {
            tracing::warn!(device_id = %device_id, "Rejected request with invalid admin session");
            unauthorized("Sesión inválida o cerrada")
        })?;

    request.extensions_mut().insert(AdminContext {
        device_id: session.device_id,
        expires_at: session.expires_at,
    });

    Ok(next.run(request).await)
}
