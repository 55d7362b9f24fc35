use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The single admin login currently allowed to act on the dashboard.
///
/// The store never holds more than one of these at a time. Only the SHA-256
/// hash of the bearer token is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminSession {
    pub device_id: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AdminSession {
    /// Sessions are valid strictly before `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewAdminSession {
    pub device_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
