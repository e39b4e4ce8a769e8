use axum::{
    extract::{Path, State},
    Json,
};

use super::{AppState, TelegramAuth};
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, User, UserCreate, UserUpdate},
    services::UserProvisioner,
};

/// POST /api/users
///
/// Returns the existing player for the authenticated Telegram user, or
/// creates one.
pub async fn create_user(
    State(state): State<AppState>,
    TelegramAuth(identity): TelegramAuth,
    Json(req): Json<UserCreate>,
) -> Result<Json<ApiResponse<User>>> {
    let provisioner = UserProvisioner::new(state.users.clone());
    let (user, _created) = provisioner.provision(&identity, req).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /api/users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state
        .users
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /api/users/telegram/{telegram_id}
pub async fn get_user_by_telegram_id(
    State(state): State<AppState>,
    Path(telegram_id): Path<i64>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state
        .users
        .get_user_by_telegram_id(telegram_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /api/users/{user_id}
pub async fn update_user(
    State(state): State<AppState>,
    TelegramAuth(identity): TelegramAuth,
    Path(user_id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<ApiResponse<User>>> {
    let provisioner = UserProvisioner::new(state.users.clone());
    let user = provisioner.update_profile(&identity, &user_id, update).await?;
    Ok(Json(ApiResponse::success(user)))
}
