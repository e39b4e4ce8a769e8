use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::Result,
    models::{GameScore, User, UserUpdate},
};

/// Player storage. Records are keyed by `id` and unique per `telegram_id`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    async fn get_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>>;

    /// Stores `user` unless a record with the same `telegram_id` exists.
    /// Returns the stored record and whether it was inserted by this call.
    async fn create_user_if_absent(&self, user: User) -> Result<(User, bool)>;

    /// Overwrites the fields set in `update`. `None` when the user does not exist.
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>>;

    /// Counts one finished game: `games_played + 1`, `total_score + score`,
    /// `best_score = max(best_score, score)`. `None` when the user does not exist.
    async fn record_game(&self, id: &str, score: i64) -> Result<Option<User>>;

    /// Players with `best_score > 0`, best first, at most `limit`.
    async fn top_users(&self, limit: usize) -> Result<Vec<User>>;

    /// Number of players whose `best_score` is strictly greater than `best_score`.
    async fn count_users_above(&self, best_score: i64) -> Result<usize>;

    async fn count_users(&self) -> Result<usize>;
}

/// Finished-game history.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn insert_score(&self, score: GameScore) -> Result<()>;

    /// Newest first, at most `limit`.
    async fn recent_scores(&self, user_id: &str, limit: usize) -> Result<Vec<GameScore>>;
}

#[derive(Debug, Default)]
struct UserTable {
    users: HashMap<String, User>,
    by_telegram_id: HashMap<i64, String>,
}

/// Process-local user store. Everything lives behind one lock, so the store
/// is always reachable and multi-field updates are atomic.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ==================== USER QUERIES ====================
#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.table.read().await.users.get(id).cloned())
    }

    async fn get_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        let table = self.table.read().await;
        Ok(table
            .by_telegram_id
            .get(&telegram_id)
            .and_then(|id| table.users.get(id))
            .cloned())
    }

    async fn create_user_if_absent(&self, user: User) -> Result<(User, bool)> {
        // Cek dan insert di bawah satu write guard supaya request paralel tidak membuat duplikat
        let mut table = self.table.write().await;
        if let Some(existing) = table
            .by_telegram_id
            .get(&user.telegram_id)
            .and_then(|id| table.users.get(id))
        {
            return Ok((existing.clone(), false));
        }
        table.by_telegram_id.insert(user.telegram_id, user.id.clone());
        table.users.insert(user.id.clone(), user.clone());
        Ok((user, true))
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>> {
        let mut table = self.table.write().await;
        let Some(user) = table.users.get_mut(id) else {
            return Ok(None);
        };

        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(photo_url) = update.photo_url {
            user.photo_url = Some(photo_url);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn record_game(&self, id: &str, score: i64) -> Result<Option<User>> {
        let mut table = self.table.write().await;
        let Some(user) = table.users.get_mut(id) else {
            return Ok(None);
        };

        user.games_played += 1;
        user.total_score += score;
        user.best_score = user.best_score.max(score);
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<User>> {
        let table = self.table.read().await;
        let mut ranked: Vec<User> = table
            .users
            .values()
            .filter(|u| u.best_score > 0)
            .cloned()
            .collect();
        ranked.sort_by(|a, b| {
            b.best_score
                .cmp(&a.best_score)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn count_users_above(&self, best_score: i64) -> Result<usize> {
        let table = self.table.read().await;
        Ok(table
            .users
            .values()
            .filter(|u| u.best_score > best_score)
            .count())
    }

    async fn count_users(&self) -> Result<usize> {
        Ok(self.table.read().await.users.len())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryScoreStore {
    scores: RwLock<Vec<GameScore>>,
}

impl InMemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ==================== SCORE QUERIES ====================
#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn insert_score(&self, score: GameScore) -> Result<()> {
        self.scores.write().await.push(score);
        Ok(())
    }

    async fn recent_scores(&self, user_id: &str, limit: usize) -> Result<Vec<GameScore>> {
        let scores = self.scores.read().await;
        // Iterasi terbalik: skor yang disisipkan belakangan menang saat created_at sama
        let mut recent: Vec<GameScore> = scores
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }
}
