use std::sync::Arc;

use crate::{
    constants::USERNAME_FALLBACK_PREFIX,
    db::UserStore,
    error::{AppError, Result},
    models::{TelegramUser, User, UserCreate, UserUpdate},
};

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Picks the display username: request body, then Telegram username, then
/// first name, then `user<telegram_id>`.
fn resolve_username(req: &UserCreate, identity: &TelegramUser) -> String {
    non_empty(req.username.clone())
        .or_else(|| non_empty(identity.username.clone()))
        .or_else(|| non_empty(identity.first_name.clone()))
        .unwrap_or_else(|| format!("{USERNAME_FALLBACK_PREFIX}{}", identity.id))
}

/// User Provisioner - creates player records for authenticated Telegram users
pub struct UserProvisioner {
    store: Arc<dyn UserStore>,
}

impl UserProvisioner {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create the player for `identity` if it does not exist yet, else return
    /// the existing record. The returned flag is `true` when a record was created.
    pub async fn provision(&self, identity: &TelegramUser, req: UserCreate) -> Result<(User, bool)> {
        if req.telegram_id <= 0 {
            return Err(AppError::BadRequest("telegram_id must be positive".to_string()));
        }
        if req.telegram_id != identity.id {
            tracing::warn!(
                "telegram_id mismatch: body {} vs init data {}",
                req.telegram_id,
                identity.id
            );
            return Err(AppError::Forbidden(
                "telegram_id does not match the authenticated user".to_string(),
            ));
        }

        if let Some(existing) = self.store.get_user_by_telegram_id(identity.id).await? {
            tracing::info!("User with telegram_id {} already exists", identity.id);
            return Ok((existing, false));
        }

        let user = User::new(
            identity.id,
            resolve_username(&req, identity),
            non_empty(req.first_name).or_else(|| identity.first_name.clone()),
            non_empty(req.last_name).or_else(|| identity.last_name.clone()),
            non_empty(req.photo_url).or_else(|| identity.photo_url.clone()),
        );

        let (user, created) = self.store.create_user_if_absent(user).await?;
        if created {
            tracing::info!("Created user {} for telegram_id {}", user.id, user.telegram_id);
        }
        Ok((user, created))
    }

    /// Apply `update` to the authenticated player's own record. Blank
    /// optional fields are ignored; a blank username is rejected.
    pub async fn update_profile(
        &self,
        identity: &TelegramUser,
        user_id: &str,
        update: UserUpdate,
    ) -> Result<User> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.telegram_id != identity.id {
            tracing::warn!(
                "profile update for user {} by telegram_id {}",
                user.id,
                identity.id
            );
            return Err(AppError::Forbidden(
                "Cannot update another user's profile".to_string(),
            ));
        }

        let username = match update.username {
            Some(raw) => match non_empty(Some(raw)) {
                Some(name) => Some(name),
                None => return Err(AppError::BadRequest("username must not be empty".to_string())),
            },
            None => None,
        };
        let update = UserUpdate {
            username,
            first_name: non_empty(update.first_name),
            last_name: non_empty(update.last_name),
            photo_url: non_empty(update.photo_url),
        };

        self.store
            .update_user(&user.id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
