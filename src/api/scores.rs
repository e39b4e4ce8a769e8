use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{AppState, TelegramAuth};
use crate::{
    constants::{SCORE_HISTORY_DEFAULT_LIMIT, SCORE_HISTORY_MAX_LIMIT},
    error::Result,
    models::{ApiResponse, GameScore, GameScoreCreate},
    services::ScoreService,
    utils::resolve_limit,
};

#[derive(Debug, Deserialize)]
pub struct ScoreHistoryQuery {
    pub limit: Option<usize>,
}

fn score_service(state: &AppState) -> ScoreService {
    ScoreService::new(state.users.clone(), state.scores.clone())
}

/// POST /api/scores
pub async fn submit_score(
    State(state): State<AppState>,
    TelegramAuth(identity): TelegramAuth,
    Json(req): Json<GameScoreCreate>,
) -> Result<Json<ApiResponse<GameScore>>> {
    let score = score_service(&state).submit(&identity, req).await?;
    Ok(Json(ApiResponse::success(score)))
}

/// GET /api/scores/user/{user_id}
pub async fn get_user_scores(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ScoreHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<GameScore>>>> {
    let limit = resolve_limit(
        query.limit,
        SCORE_HISTORY_DEFAULT_LIMIT,
        SCORE_HISTORY_MAX_LIMIT,
    )?;
    let scores = score_service(&state).user_scores(&user_id, limit).await?;
    Ok(Json(ApiResponse::success(scores)))
}
