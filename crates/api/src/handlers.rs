pub mod health;
pub mod session;

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use cyt_auth::AuthError;
use cyt_models::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) const INTERNAL_ERROR: &str = "Error interno del servidor";

/// Map a service failure to its HTTP status. Store details stay in the log.
pub fn auth_error_response(err: AuthError) -> ApiError {
    match err {
        AuthError::ValidationError(message) => {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(&message)))
        }
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(&AuthError::InvalidCredentials.to_string())),
        ),
        AuthError::Store(e) => {
            tracing::error!("Admin session store error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(INTERNAL_ERROR)),
            )
        }
    }
}

/// Malformed or non-JSON bodies are reported like missing fields.
pub fn json_rejection_response(rejection: JsonRejection, message: &str) -> ApiError {
    tracing::debug!("Rejected request body: {}", rejection);
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}
