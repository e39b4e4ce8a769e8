use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;
use crate::{constants::SERVICE_NAME, error::{AppError, Result}};

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub users: usize,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{SERVICE_NAME} is running!"),
    })
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    // Store yang tidak merespon berarti service tidak sehat (503)
    let users = state.users.count_users().await.map_err(|err| {
        tracing::error!("User store health check failed: {}", err);
        AppError::ServiceUnavailable("Database connection failed".to_string())
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: "connected".to_string(),
        users,
        timestamp: Utc::now(),
    }))
}
