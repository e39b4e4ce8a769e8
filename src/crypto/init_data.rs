//! Telegram WebApp `initData` verification.
//!
//! The host signs every `key=value` pair it injects into the mini-app. The
//! signature is `HEX(HMAC_SHA256(signing_key, data_check_string))` where
//! `signing_key = HMAC_SHA256("WebAppData", bot_token)` and the data-check
//! string is every pair except `hash`, sorted by key and joined with `\n`.
//!
//! See <https://core.telegram.org/bots/webapps#validating-data-received-via-the-mini-app>

use std::collections::HashMap;
use std::fmt;

use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::crypto::hash::{hmac_sha256, hmac_sha256_hex};
use crate::models::TelegramUser;

/// Label used as the HMAC key when deriving the signing key from the bot token.
pub const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

const HASH_KEY: &str = "hash";
const USER_KEY: &str = "user";

#[derive(Error, Debug)]
pub enum InitDataError {
    #[error("bot secret is not configured")]
    MissingSecret,

    #[error("init data is empty")]
    Empty,

    #[error("malformed token at position {0}")]
    MalformedToken(usize),

    #[error("missing hash field")]
    MissingHash,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("missing user field")]
    MissingUser,

    #[error("malformed user payload: {0}")]
    MalformedUser(String),
}

impl InitDataError {
    /// `true` for server misconfiguration, `false` for anything the client sent.
    pub fn is_config_error(&self) -> bool {
        matches!(self, InitDataError::MissingSecret)
    }
}

/// One parse of a raw `initData` string.
///
/// `tokens` keeps every pair in arrival order, duplicates included. `lookup`
/// folds the same pairs into a map where the last occurrence of a key wins;
/// it is only used for the `hash` and `user` lookups.
#[derive(Debug)]
pub struct InitData<'a> {
    tokens: Vec<(&'a str, &'a str)>,
    lookup: HashMap<&'a str, &'a str>,
}

impl<'a> InitData<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, InitDataError> {
        if raw.is_empty() {
            return Err(InitDataError::Empty);
        }

        let mut tokens = Vec::new();
        let mut lookup = HashMap::new();
        for (position, token) in raw.split('&').enumerate() {
            let (key, value) = token
                .split_once('=')
                .ok_or(InitDataError::MalformedToken(position))?;
            tokens.push((key, value));
            lookup.insert(key, value);
        }

        Ok(Self { tokens, lookup })
    }

    /// Value of `key`, last occurrence wins. Values are returned as received.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.lookup.get(key).copied()
    }

    pub fn received_hash(&self) -> Result<&'a str, InitDataError> {
        self.get(HASH_KEY).ok_or(InitDataError::MissingHash)
    }

    /// Every non-`hash` pair sorted byte-wise by key, `key=value` joined by `\n`.
    ///
    /// Pairs sharing a key are ordered by value so that the result does not
    /// depend on the order the tokens arrived in.
    pub fn data_check_string(&self) -> String {
        let mut signed: Vec<(&str, &str)> = self
            .tokens
            .iter()
            .filter(|(key, _)| *key != HASH_KEY)
            .copied()
            .collect();
        signed.sort_unstable();

        signed
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Verifier bound to one bot token. The signing key is derived once on
/// construction; the validator holds no other state and is safe to share
/// between request handlers.
#[derive(Clone)]
pub struct InitDataValidator {
    signing_key: [u8; 32],
}

impl fmt::Debug for InitDataValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitDataValidator").finish_non_exhaustive()
    }
}

impl InitDataValidator {
    pub fn new(bot_secret: &str) -> Result<Self, InitDataError> {
        if bot_secret.trim().is_empty() {
            return Err(InitDataError::MissingSecret);
        }
        Ok(Self {
            signing_key: hmac_sha256(WEB_APP_DATA_KEY, bot_secret.as_bytes()),
        })
    }

    /// Lowercase hex signature the host would attach to `data_check_string`.
    pub fn sign(&self, data_check_string: &str) -> String {
        hmac_sha256_hex(&self.signing_key, data_check_string.as_bytes())
    }

    /// Verifies the signature of `raw_init_data` and returns the signed identity.
    ///
    /// The `user` field is not looked at until the signature has matched.
    pub fn validate(&self, raw_init_data: &str) -> Result<TelegramUser, InitDataError> {
        let init_data = InitData::parse(raw_init_data)?;
        let received_hash = init_data.received_hash()?;

        let computed_hash = self.sign(&init_data.data_check_string());
        if !bool::from(computed_hash.as_bytes().ct_eq(received_hash.as_bytes())) {
            return Err(InitDataError::InvalidSignature);
        }

        let raw_user = init_data.get(USER_KEY).ok_or(InitDataError::MissingUser)?;
        let decoded = urlencoding::decode(raw_user)
            .map_err(|e| InitDataError::MalformedUser(e.to_string()))?;
        serde_json::from_str(&decoded).map_err(|e| InitDataError::MalformedUser(e.to_string()))
    }
}

/// One-shot form of [`InitDataValidator::validate`].
pub fn validate(raw_init_data: &str, bot_secret: &str) -> Result<TelegramUser, InitDataError> {
    InitDataValidator::new(bot_secret)?.validate(raw_init_data)
}
