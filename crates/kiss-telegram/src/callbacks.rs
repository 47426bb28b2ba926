//! Inline keyboard callbacks: client selection and recording duration.

use std::sync::Arc;

use kiss_host::RECORD_DURATIONS;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MaybeInaccessibleMessage, MessageId, UserId,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::handlers::{record_audio, report, Action};
use crate::state::BotState;
use crate::store::SessionStore;

/// Payload prefix of the client menu buttons.
pub const SELECT_CLIENT_PREFIX: &str = "select_client_";

/// Payload of the client menu's exit button.
pub const EXIT_CLIENT_SELECTION: &str = "exit_client_selection";

/// A parsed callback payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    SelectClient(UserId),
    ExitClientSelection,
    /// Record for this many seconds.
    Record(u32),
}

impl CallbackAction {
    /// Parse a button payload. Unknown payloads yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(id) = data.strip_prefix(SELECT_CLIENT_PREFIX) {
            return id.parse::<u64>().ok().map(|id| Self::SelectClient(UserId(id)));
        }
        if data == EXIT_CLIENT_SELECTION {
            return Some(Self::ExitClientSelection);
        }
        if data.is_empty() || !data.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        data.parse::<u32>()
            .ok()
            .filter(|secs| RECORD_DURATIONS.contains(secs))
            .map(Self::Record)
    }

    /// The payload a button carries for this action.
    pub fn payload(&self) -> String {
        match self {
            Self::SelectClient(id) => format!("{}{}", SELECT_CLIENT_PREFIX, id.0),
            Self::ExitClientSelection => EXIT_CLIENT_SELECTION.to_string(),
            Self::Record(secs) => secs.to_string(),
        }
    }
}

/// Client buttons per keyboard row. Telegram caps a row at 8.
pub const CLIENTS_PER_ROW: usize = 4;

/// Keyboard for `/clients`: one button per authenticated operator, then Exit.
pub fn client_keyboard(operators: &[UserId]) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = operators
        .iter()
        .enumerate()
        .map(|(i, id)| {
            InlineKeyboardButton::callback(
                format!("Client {}", i + 1),
                CallbackAction::SelectClient(*id).payload(),
            )
        })
        .collect();

    let mut rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .chunks(CLIENTS_PER_ROW)
        .map(|row| row.to_vec())
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "Exit",
        CallbackAction::ExitClientSelection.payload(),
    )]);

    InlineKeyboardMarkup::new(rows)
}

/// Keyboard for `/record`, one offered duration per row.
pub fn duration_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(RECORD_DURATIONS.iter().map(|secs| {
        vec![InlineKeyboardButton::callback(
            format!("{} seconds", secs),
            CallbackAction::Record(*secs).payload(),
        )]
    }))
}

/// Apply a client menu action and return the text that replaces the menu.
///
/// Returns `None` for actions that are not client selections.
pub async fn apply_selection(
    store: &SessionStore,
    operator: UserId,
    action: CallbackAction,
) -> Result<Option<String>> {
    match action {
        CallbackAction::SelectClient(target) => {
            store.select_target(operator, target).await?;
            Ok(Some(format!("Selected Client {}.", target.0)))
        }
        CallbackAction::ExitClientSelection => {
            store.clear_target(operator).await?;
            Ok(Some("Exited client selection.".to_string()))
        }
        CallbackAction::Record(_) => Ok(None),
    }
}

/// Route a button press.
///
/// The query is always answered first so the client's loading indicator
/// clears, whatever happens next.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let operator = q.from.id;
    let Some(data) = q.data.as_deref() else {
        debug!(operator = operator.0, "Callback without data");
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(data) else {
        warn!(operator = operator.0, data = %data, "Unrecognized callback payload");
        return Ok(());
    };

    let menu: Option<(ChatId, MessageId)> = match &q.message {
        Some(MaybeInaccessibleMessage::Regular(m)) => Some((m.chat.id, m.id)),
        _ => None,
    };
    let chat_id = match menu {
        Some((chat_id, _)) => chat_id,
        None => match state.sessions().chat_id(operator).await {
            Some(chat_id) => chat_id,
            None => {
                debug!(operator = operator.0, "Callback from operator without a session");
                return Ok(());
            }
        },
    };

    if let Err(e) = state.sessions().require_authenticated(operator).await {
        bot.send_message(chat_id, e.to_string()).await?;
        return Ok(());
    }

    info!(chat_id = %chat_id, operator = operator.0, action = ?action, "Callback received");

    match action {
        CallbackAction::Record(secs) => {
            let result = record_audio(&bot, chat_id, &state, secs).await;
            report(&bot, chat_id, Action::Record, result).await
        }
        selection => {
            let text = match apply_selection(state.sessions(), operator, selection).await {
                Ok(Some(text)) => text,
                Ok(None) => return Ok(()),
                Err(e) => {
                    warn!(operator = operator.0, error = %e, "Client selection failed");
                    e.to_string()
                }
            };
            match menu {
                Some((chat_id, message_id)) => {
                    bot.edit_message_text(chat_id, message_id, text).await?;
                }
                None => {
                    bot.send_message(chat_id, text).await?;
                }
            }
            Ok(())
        }
    }
}
