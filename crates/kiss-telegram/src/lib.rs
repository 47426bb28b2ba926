//! Telegram bot interface for KISS Controller.
//!
//! An operator authenticates with a shared password and then drives the host
//! through bot commands: system and network information, screenshots, audio
//! recordings, filesystem browsing and file retrieval. Host work is done by
//! the `kiss-host` crate on blocking worker threads.
//!
//! # Environment Variables
//!
//! Required:
//! - `KISS_BOT_TOKEN`: Bot token from @BotFather
//! - `KISS_PASSWORD`: Operator password
//!
//! See [`config`] for the optional settings.
//!
//! # Example
//!
//! ```no_run
//! use kiss_telegram::{BotConfig, KissBot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BotConfig::from_env()?;
//!     let bot = KissBot::new(&config);
//!     bot.start_polling().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/login <password>` - Authenticate
//! - `/start`, `/help` - Show available commands
//! - `/clients` - Pick a client session
//! - `/info` - System information
//! - `/network` - Network information
//! - `/screenshot` - Capture the screen
//! - `/record` - Record 5, 15 or 30 seconds of audio
//! - `/explore [cd|ls|cat <path>]` - Browse the filesystem
//! - `/getfile <path>` - Download a file

pub mod auth;
pub mod bot;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod handlers;
pub mod session;
pub mod state;
pub mod store;

pub use auth::{LoginOutcome, LoginPolicy};
pub use bot::KissBot;
pub use callbacks::CallbackAction;
pub use config::BotConfig;
pub use error::{BotError, Result};
pub use handlers::Command;
pub use session::Session;
pub use state::{create_shared_state, BotState};
pub use store::SessionStore;
