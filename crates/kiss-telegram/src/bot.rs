//! Main Telegram bot implementation.

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::callbacks::handle_callback;
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::handlers::{handle_command, handle_unknown, Command};
use crate::state::{create_shared_state, BotState};

/// The KISS Controller bot.
pub struct KissBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers.
    state: Arc<BotState>,
}

impl KissBot {
    /// Create the bot from validated configuration.
    pub fn new(config: &BotConfig) -> Self {
        Self {
            bot: Bot::new(config.token.clone()),
            state: create_shared_state(config),
        }
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Run the long-polling dispatcher until Ctrl-C.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        let bot = self.bot.clone();

        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Failed to register command menu");
        }

        let state_for_commands = Arc::clone(&self.state);
        let state_for_callbacks = Arc::clone(&self.state);

        let handler = dptree::entry()
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                    let state = Arc::clone(&state_for_callbacks);
                    async move { handle_callback(bot, q, state).await }
                }),
            )
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(handle_unknown),
            );

        info!("Bot is running! Send /login to begin.");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                debug!(update = ?upd.id, "Unhandled update");
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Bot stopped");
        Ok(())
    }
}
