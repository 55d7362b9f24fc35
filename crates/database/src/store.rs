use crate::error::Result;
use cyt_models::{AdminSession, NewAdminSession};
use std::future::Future;

/// Outcome of an exclusive create.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session: AdminSession,
    /// Rows removed to make room for the new session.
    pub evicted: u64,
}

/// Storage contract for the single admin session.
///
/// Implementations hold at most one row. `create_exclusive` must remove every
/// existing row and insert the new one as a single atomic step, so two racing
/// callers never leave two rows behind.
pub trait SessionStore: Send + Sync + 'static {
    /// Delete every session, then insert `new_session`.
    fn create_exclusive(
        &self,
        new_session: &NewAdminSession,
    ) -> impl Future<Output = Result<CreatedSession>> + Send;

    /// The session matching both `device_id` and `token_hash`, if it has not expired.
    fn find_valid(
        &self,
        device_id: &str,
        token_hash: &str,
    ) -> impl Future<Output = Result<Option<AdminSession>>> + Send;

    /// Remove the session owned by `device_id`. Returns the number of rows removed.
    fn delete_by_device(&self, device_id: &str) -> impl Future<Output = Result<u64>> + Send;

    fn delete_all(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Whether an unexpired session exists, ignoring `exclude_device_id` if given.
    fn has_active(
        &self,
        exclude_device_id: Option<&str>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Drop rows whose expiry has passed. Housekeeping only.
    fn cleanup_expired(&self) -> impl Future<Output = Result<u64>> + Send;
}
