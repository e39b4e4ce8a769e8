// ============================================================================
// Telegram WebApp Authentication Extractor
// ============================================================================
//
// The mini-app sends the raw `Telegram.WebApp.initData` string in the
// X-Telegram-Init-Data header. Handlers that take `TelegramAuth` only run
// once the signature over that string has been verified.
//
// Every rejection carries the same public message; the precise reason is
// logged here.
//
// ============================================================================

use axum::{extract::FromRequestParts, http::request::Parts};

use super::AppState;
use crate::{
    constants::INIT_DATA_HEADER,
    error::{AppError, INVALID_INIT_DATA_MESSAGE},
    models::TelegramUser,
};

/// Authenticated Telegram identity taken from verified init data.
#[derive(Debug, Clone)]
pub struct TelegramAuth(pub TelegramUser);

impl FromRequestParts<AppState> for TelegramAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(INIT_DATA_HEADER)
            .ok_or_else(|| {
                tracing::warn!("Rejected request without {} header", INIT_DATA_HEADER);
                AppError::AuthError(INVALID_INIT_DATA_MESSAGE.to_string())
            })?
            .to_str()
            .map_err(|_| {
                tracing::warn!("Rejected non-ASCII {} header", INIT_DATA_HEADER);
                AppError::AuthError(INVALID_INIT_DATA_MESSAGE.to_string())
            })?;

        match state.validator.validate(raw) {
            Ok(user) => {
                tracing::debug!("Verified init data for telegram_id {}", user.id);
                Ok(TelegramAuth(user))
            }
            Err(err) => {
                tracing::warn!(reason = %err, "Rejected Telegram init data");
                Err(err.into())
            }
        }
    }
}
