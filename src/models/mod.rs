// src/models/mod.rs
pub mod score;
pub mod user;

pub use score::{GameScore, GameScoreCreate, LeaderboardEntry, UserStats};
pub use user::{ApiResponse, TelegramUser, User, UserCreate, UserUpdate};
