use crate::config::RateLimitConfig;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cyt_models::ErrorResponse;
use moka::future::Cache;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Window {
    started: Instant,
    attempts: AtomicU32,
}

/// Fixed-window login attempt counter, per client key.
///
/// Entries expire with their window, which resets the count. Counts are
/// per process; they are not shared between instances.
pub struct LoginRateLimiter {
    windows: Cache<String, Arc<Window>>,
    max_attempts: u32,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(config.window)
                .build(),
            max_attempts: config.max_attempts,
            window: config.window,
        }
    }

    /// Record an attempt. Returns `Err(retry_after_secs)` once the window is full.
    pub async fn check(&self, key: &str) -> Result<(), u64> {
        let window = self
            .windows
            .get_with(key.to_string(), async {
                Arc::new(Window {
                    started: Instant::now(),
                    attempts: AtomicU32::new(0),
                })
            })
            .await;

        let attempts = window.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempts <= self.max_attempts {
            return Ok(());
        }

        let remaining = self.window.saturating_sub(window.started.elapsed());
        Err(remaining.as_secs().max(1))
    }
}

/// Extract IP address from request headers
fn extract_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

/// Rate limit middleware for admin login attempts
pub async fn rate_limit_login(
    State(limiter): State<Arc<LoginRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_ip(request.headers());

    match limiter.check(&format!("admin_login:{}", ip)).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!("Rate limit exceeded for admin login from IP: {}", ip);
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse {
                    error: format!(
                        "Demasiados intentos. Intenta de nuevo en {} segundos.",
                        retry_after
                    ),
                    retry_after: Some(retry_after),
                }),
            )
                .into_response()
        }
    }
}
