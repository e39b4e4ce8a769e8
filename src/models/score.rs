use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

// ==================== SCORE ====================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameScore {
    pub id: String,
    pub user_id: String,
    pub score: i64,
    pub game_duration: Option<i64>, // detik
    pub created_at: DateTime<Utc>,
}

impl GameScore {
    pub fn new(user_id: String, score: i64, game_duration: Option<i64>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            score,
            game_duration,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameScoreCreate {
    pub user_id: String,
    pub score: i64,
    pub game_duration: Option<i64>,
}

// ==================== LEADERBOARD ====================
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub photo_url: Option<String>,
    pub best_score: i64,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub user: User,
    pub rank: usize,
    pub recent_scores: Vec<GameScore>,
}
