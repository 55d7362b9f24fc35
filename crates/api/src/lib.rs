//! HTTP surface for the single-admin-session service.

pub mod cleanup;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;

use cyt_auth::AdminSessionService;
use cyt_database::Database;
use middleware::LoginRateLimiter;
use std::sync::Arc;

pub use config::Config;
pub use routes::create_router;

pub struct AppState<S> {
    pub sessions: AdminSessionService<S>,
    pub login_limiter: Arc<LoginRateLimiter>,
    /// Present when backed by Postgres; pinged by `/health`.
    pub database: Option<Database>,
}

impl<S> AppState<S> {
    pub fn new(sessions: AdminSessionService<S>, login_limiter: LoginRateLimiter) -> Self {
        Self {
            sessions,
            login_limiter: Arc::new(login_limiter),
            database: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}
