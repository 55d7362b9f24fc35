//! JSON bodies exchanged on `/api/admin/session/*`.
//!
//! Request fields are optional at the serde level so that a missing field
//! reaches validation (400) instead of failing deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub username: Option<String>,

    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub password: Option<String>,

    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub device_id: Option<String>,
}

impl LoginRequest {
    pub fn new(username: &str, password: &str, device_id: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            device_id: Some(device_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub device_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub device_id: Option<String>,

    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub token: Option<String>,
}

impl VerifyRequest {
    pub fn new(device_id: &str, token: &str) -> Self {
        Self {
            device_id: Some(device_id.to_string()),
            token: Some(token.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionResponse {
    pub has_active_session: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Returned to a guarded request for the caller's own session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSessionResponse {
    pub device_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            retry_after: None,
        }
    }
}
