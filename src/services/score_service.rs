use std::sync::Arc;

use crate::{
    constants::STATS_RECENT_SCORES,
    db::{ScoreStore, UserStore},
    error::{AppError, Result},
    models::{GameScore, GameScoreCreate, LeaderboardEntry, TelegramUser, UserStats},
};

/// Score Service - records finished games and derives rankings
pub struct ScoreService {
    users: Arc<dyn UserStore>,
    scores: Arc<dyn ScoreStore>,
}

impl ScoreService {
    pub fn new(users: Arc<dyn UserStore>, scores: Arc<dyn ScoreStore>) -> Self {
        Self { users, scores }
    }

    /// Store a finished game for the authenticated player and fold it into
    /// their statistics.
    pub async fn submit(&self, identity: &TelegramUser, req: GameScoreCreate) -> Result<GameScore> {
        if req.score < 0 {
            return Err(AppError::BadRequest("score must not be negative".to_string()));
        }
        if req.game_duration.is_some_and(|d| d < 0) {
            return Err(AppError::BadRequest(
                "game_duration must not be negative".to_string(),
            ));
        }

        let user = self
            .users
            .get_user(&req.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.telegram_id != identity.id {
            tracing::warn!(
                "score submission for user {} by telegram_id {}",
                user.id,
                identity.id
            );
            return Err(AppError::Forbidden(
                "Cannot submit scores for another user".to_string(),
            ));
        }

        let score = GameScore::new(user.id.clone(), req.score, req.game_duration);
        self.scores.insert_score(score.clone()).await?;
        self.users
            .record_game(&user.id, score.score)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!("Recorded score {} for user {}", score.score, user.id);
        Ok(score)
    }

    pub async fn user_scores(&self, user_id: &str, limit: usize) -> Result<Vec<GameScore>> {
        self.scores.recent_scores(user_id, limit).await
    }

    /// Players with a positive best score, ranked from 1.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let users = self.users.top_users(limit).await?;
        Ok(users
            .into_iter()
            .enumerate()
            .map(|(idx, user)| LeaderboardEntry {
                rank: idx + 1,
                user_id: user.id,
                username: user.username,
                photo_url: user.photo_url,
                best_score: user.best_score,
            })
            .collect())
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // Rank = jumlah pemain dengan best_score lebih tinggi + 1
        let rank = self.users.count_users_above(user.best_score).await? + 1;
        let recent_scores = self.scores.recent_scores(user_id, STATS_RECENT_SCORES).await?;

        Ok(UserStats {
            user,
            rank,
            recent_scores,
        })
    }
}
