// Cielo y Tierra admin session server
// Enforces a single logged-in admin device at a time

use anyhow::Context;
use axum::http::HeaderValue;
use cyt_api::{cleanup, create_router, middleware::LoginRateLimiter, AppState, Config};
use cyt_auth::AdminSessionService;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,cyt_api=debug,tower_http=debug".to_string()),
        )
        .init();

    tracing::info!("Starting admin session server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    tracing::info!("Server: {}", config.bind_address());

    // Initialize database
    tracing::info!("Connecting to database...");
    let database = cyt_database::Database::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    database.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Database connected");

    let sessions = AdminSessionService::new(database.admin_sessions(), config.session.clone());
    tracing::info!(
        admin = config.session.credentials.username(),
        ttl_days = config.session.session_ttl.num_days(),
        "Admin session service initialized"
    );

    let state = Arc::new(
        AppState::new(sessions, LoginRateLimiter::new(&config.login_rate_limit))
            .with_database(database.clone()),
    );

    let shutdown = CancellationToken::new();
    let cleanup_task =
        cleanup::spawn_session_cleanup(state.clone(), config.cleanup_interval, shutdown.clone());

    let app = create_router(state)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http());

    tracing::info!("Routes configured:");
    tracing::info!("   GET  /health");
    tracing::info!("   POST /api/admin/session/login");
    tracing::info!("   POST /api/admin/session/verify");
    tracing::info!("   GET  /api/admin/session/verify");
    tracing::info!("   POST /api/admin/session/logout");
    tracing::info!("   GET  /api/admin/session/me");

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server ready at http://{}", addr);

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
            signal.cancel();
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    cleanup_task.await.ok();
    database.close().await;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
