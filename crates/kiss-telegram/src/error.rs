//! Error types for the Telegram bot.

use kiss_host::HostError;
use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided.
    #[error("Bot token not set. Set KISS_BOT_TOKEN environment variable.")]
    NoToken,

    /// Bot token does not look like `<id>:<secret>`.
    #[error("Bot token is malformed. Expected <id>:<secret>.")]
    InvalidToken,

    /// Operator password not provided.
    #[error("Operator password not set. Set KISS_PASSWORD environment variable.")]
    NoPassword,

    /// An optional setting could not be parsed.
    #[error("Invalid value for {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Operator has no authenticated session.
    #[error("Please authenticate using the /login command first.")]
    NotAuthenticated,

    /// Too many failed logins.
    #[error("Too many failed login attempts. Try again in {remaining_secs} seconds.")]
    LockedOut { remaining_secs: u64 },

    /// Selected client is not an authenticated session.
    #[error("Unknown client {0}.")]
    UnknownClient(u64),

    /// Host operation failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Telegram request failed.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Blocking job could not run to completion.
    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

impl From<teloxide::RequestError> for BotError {
    fn from(e: teloxide::RequestError) -> Self {
        BotError::Delivery(e.to_string())
    }
}

impl From<tokio::task::JoinError> for BotError {
    fn from(e: tokio::task::JoinError) -> Self {
        BotError::Worker(e.to_string())
    }
}
