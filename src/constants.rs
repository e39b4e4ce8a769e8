/// Application constants

pub const SERVICE_NAME: &str = "Block Blast Game API";

// Server
pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_LOG_FILTER: &str = "block_blast_backend=debug,tower_http=debug";

// Telegram WebApp
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

// Fallback username prefix when Telegram sends neither username nor first name
pub const USERNAME_FALLBACK_PREFIX: &str = "user";

// Game
pub const LEADERBOARD_DEFAULT_LIMIT: usize = 50;
pub const LEADERBOARD_MAX_LIMIT: usize = 100;
pub const SCORE_HISTORY_DEFAULT_LIMIT: usize = 10;
pub const SCORE_HISTORY_MAX_LIMIT: usize = 100;
pub const STATS_RECENT_SCORES: usize = 5;
