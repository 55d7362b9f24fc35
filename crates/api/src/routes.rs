use crate::handlers;
use crate::middleware;
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use cyt_database::SessionStore;
use std::sync::Arc;

pub fn create_router<S: SessionStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check::<S>))
        // Admin session routes
        .route(
            "/api/admin/session/login",
            post(handlers::session::login::<S>).layer(from_fn_with_state(
                state.login_limiter.clone(),
                middleware::rate_limit_login,
            )),
        )
        .route(
            "/api/admin/session/verify",
            post(handlers::session::verify::<S>).get(handlers::session::active_session::<S>),
        )
        .route("/api/admin/session/logout", post(handlers::session::logout::<S>))
        // Admin-protected routes
        .route(
            "/api/admin/session/me",
            get(handlers::session::me)
                .route_layer(from_fn_with_state(state.clone(), middleware::require_admin_session::<S>)),
        )
        .with_state(state)
}
