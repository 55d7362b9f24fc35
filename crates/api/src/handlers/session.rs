use crate::handlers::{auth_error_response, json_rejection_response, ApiError};
use crate::middleware::AdminContext;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use cyt_database::SessionStore;
use cyt_models::{
    ActiveSessionResponse, CurrentSessionResponse, LoginRequest, LoginResponse, LogoutRequest,
    LogoutResponse, VerifyRequest, VerifyResponse,
};
use serde::Deserialize;
use std::sync::Arc;

/// POST /api/admin/session/login
///
/// Evicts every other admin session on success.
pub async fn login<S: SessionStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        json_rejection_response(e, "Usuario, contraseña y Device ID requeridos")
    })?;

    state
        .sessions
        .login(&request)
        .await
        .map(Json)
        .map_err(auth_error_response)
}

/// POST /api/admin/session/verify
pub async fn verify<S: SessionStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| json_rejection_response(e, "Device ID y token requeridos"))?;

    let valid = state
        .sessions
        .verify(&request)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(VerifyResponse { valid }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionQuery {
    /// Ignore this device's own session when answering.
    pub exclude_device_id: Option<String>,
}

/// GET /api/admin/session/verify
///
/// Informational only; requires no credentials.
pub async fn active_session<S: SessionStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ActiveSessionQuery>,
) -> Result<Json<ActiveSessionResponse>, ApiError> {
    let exclude = query.exclude_device_id.as_deref().filter(|d| !d.is_empty());

    let has_active_session = state
        .sessions
        .has_active_session(exclude)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(ActiveSessionResponse { has_active_session }))
}

/// POST /api/admin/session/logout
pub async fn logout<S: SessionStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<Json<LogoutResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| json_rejection_response(e, "Device ID requerido"))?;

    state
        .sessions
        .logout(&request)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(LogoutResponse { success: true }))
}

/// GET /api/admin/session/me
pub async fn me(Extension(admin): Extension<AdminContext>) -> Json<CurrentSessionResponse> {
    Json(CurrentSessionResponse {
        device_id: admin.device_id,
        expires_at: admin.expires_at,
    })
}
