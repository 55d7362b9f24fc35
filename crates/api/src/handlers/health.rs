use crate::AppState;
use axum::{extract::State, Json};
use cyt_database::SessionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Health check endpoint
pub async fn health_check<S: SessionStore>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    let database = match &state.database {
        Some(db) => match db.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!("Database ping failed: {}", e);
                "unavailable"
            }
        },
        None => "not_configured",
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}
