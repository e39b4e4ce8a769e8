use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::{
    constants::{LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT},
    error::Result,
    models::{ApiResponse, LeaderboardEntry, UserStats},
    services::ScoreService,
    utils::resolve_limit,
};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// GET /api/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let limit = resolve_limit(query.limit, LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT)?;
    let service = ScoreService::new(state.users.clone(), state.scores.clone());
    let entries = service.leaderboard(limit).await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/stats/user/{user_id}
pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserStats>>> {
    let service = ScoreService::new(state.users.clone(), state.scores.clone());
    let stats = service.user_stats(&user_id).await?;
    Ok(Json(ApiResponse::success(stats)))
}
