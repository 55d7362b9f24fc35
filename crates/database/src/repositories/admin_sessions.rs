use crate::error::Result;
use crate::store::{CreatedSession, SessionStore};
use cyt_models::{AdminSession, NewAdminSession};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AdminSessionRepository {
    pool: PgPool,
}

impl AdminSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for AdminSessionRepository {
    /// Replace whatever session exists with a new one.
    ///
    /// The table lock serializes concurrent logins: a second transaction
    /// blocks until the first commits, then deletes the row it inserted.
    async fn create_exclusive(&self, new_session: &NewAdminSession) -> Result<CreatedSession> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("LOCK TABLE admin_sessions IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let evicted = sqlx::query("DELETE FROM admin_sessions")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let session = sqlx::query_as::<_, AdminSession>(
            r#"
            INSERT INTO admin_sessions (device_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING device_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(&new_session.device_id)
        .bind(&new_session.token_hash)
        .bind(new_session.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CreatedSession { session, evicted })
    }

    /// Find session by device and token hash
    async fn find_valid(&self, device_id: &str, token_hash: &str) -> Result<Option<AdminSession>> {
        let session = sqlx::query_as::<_, AdminSession>(
            r#"
            SELECT device_id, token_hash, expires_at, created_at
            FROM admin_sessions
            WHERE device_id = $1 AND token_hash = $2 AND expires_at > NOW()
            "#,
        )
        .bind(device_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Delete a session (logout)
    async fn delete_by_device(&self, device_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE device_id = $1")
            .bind(device_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM admin_sessions")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn has_active(&self, exclude_device_id: Option<&str>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM admin_sessions
                WHERE expires_at > NOW()
                  AND ($1::TEXT IS NULL OR device_id <> $1)
            )
            "#,
        )
        .bind(exclude_device_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
