use std::env;
use std::fmt;

use crate::constants::DEFAULT_PORT;

#[derive(Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Telegram
    pub telegram_bot_token: String,

    // CORS
    pub cors_allowed_origins: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("telegram_bot_token", &"<redacted>")
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: match env::var("PORT") {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("PORT is not a valid port number: {e}"))?,
                Err(_) => DEFAULT_PORT,
            },
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .map_err(|_| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set"))?,

            cors_allowed_origins: env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.telegram_bot_token.trim().is_empty() {
            anyhow::bail!("TELEGRAM_BOT_TOKEN is empty");
        }
        if self.host.trim().is_empty() {
            anyhow::bail!("HOST is empty");
        }

        // Token asli dari BotFather selalu berbentuk "<bot_id>:<secret>"
        if !self.telegram_bot_token.contains(':') {
            tracing::warn!("TELEGRAM_BOT_TOKEN does not look like a BotFather token");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ORIGINS is empty; falling back to permissive CORS");
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "dev" | "local")
    }
}
