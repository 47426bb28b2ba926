//! Integration tests for login, the auth gate and client selection.

use std::time::Duration;

use kiss_host::files;
use kiss_telegram::callbacks::apply_selection;
use kiss_telegram::{
    BotConfig, BotError, CallbackAction, Command, LoginOutcome, LoginPolicy, SessionStore,
};
use teloxide::types::{ChatId, UserId};
use teloxide::utils::command::BotCommands;
use tempfile::TempDir;

const PASSWORD: &str = "correct horse";

fn store_at(cwd: &std::path::Path) -> SessionStore {
    SessionStore::new(PASSWORD, LoginPolicy::default(), cwd.to_path_buf())
}

#[tokio::test]
async fn test_commands_rejected_before_login() {
    let dir = TempDir::new().unwrap();
    let store = store_at(dir.path());
    let operator = UserId(1001);

    for text in ["/start", "/info", "/network", "/screenshot", "/record", "/explore", "/getfile x"] {
        let cmd = Command::parse(text, "kissbot").unwrap();
        assert!(cmd.requires_auth(), "{} must be gated", text);
    }

    let err = store.require_authenticated(operator).await.unwrap_err();
    assert_eq!(err.to_string(), "Please authenticate using the /login command first.");
    assert!(store.is_empty().await, "the gate must not create sessions");
}

#[tokio::test]
async fn test_login_flow() {
    let dir = TempDir::new().unwrap();
    let store = store_at(dir.path());
    let operator = UserId(1001);

    let outcome = store.authenticate(operator, "wrong", ChatId(55)).await.unwrap();
    assert_eq!(outcome, LoginOutcome::Rejected { attempts_left: Some(4) });
    assert!(store.require_authenticated(operator).await.is_err());

    let outcome = store.authenticate(operator, PASSWORD, ChatId(55)).await.unwrap();
    assert!(outcome.is_success());
    assert!(store.require_authenticated(operator).await.is_ok());

    // no logout: a later bad password leaves the session authenticated
    store.authenticate(operator, "wrong", ChatId(55)).await.unwrap();
    assert!(store.require_authenticated(operator).await.is_ok());
}

#[tokio::test]
async fn test_padded_configured_password_accepts_login() {
    let dir = TempDir::new().unwrap();
    let config = BotConfig::from_lookup(|key| match key {
        "KISS_BOT_TOKEN" => Some("1:x".to_string()),
        "KISS_PASSWORD" => Some(" correct horse \n".to_string()),
        _ => None,
    })
    .unwrap();
    let store = SessionStore::new(config.password, LoginPolicy::default(), dir.path().to_path_buf());

    // "/login correct horse" hands the handler the trimmed remainder
    let outcome = store.authenticate(UserId(5), "correct horse", ChatId(5)).await.unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_lockout_then_recovery() {
    let dir = TempDir::new().unwrap();
    let policy = LoginPolicy {
        max_attempts: 1,
        lockout: Duration::from_millis(200),
    };
    let store = SessionStore::new(PASSWORD, policy, dir.path().to_path_buf());
    let operator = UserId(7);

    assert!(matches!(
        store.authenticate(operator, "nope", ChatId(7)).await,
        Err(BotError::LockedOut { .. })
    ));
    assert!(store.authenticate(operator, PASSWORD, ChatId(7)).await.is_err());

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(store
        .authenticate(operator, PASSWORD, ChatId(7))
        .await
        .unwrap()
        .is_success());
}

#[tokio::test]
async fn test_client_selection_is_per_operator() {
    let dir = TempDir::new().unwrap();
    let store = store_at(dir.path());
    let (alice, bob) = (UserId(1), UserId(2));
    store.authenticate(alice, PASSWORD, ChatId(1)).await.unwrap();
    store.authenticate(bob, PASSWORD, ChatId(2)).await.unwrap();

    let action = CallbackAction::parse("select_client_2").unwrap();
    let text = apply_selection(&store, alice, action).await.unwrap();
    assert_eq!(text.as_deref(), Some("Selected Client 2."));
    assert_eq!(store.selected_target(alice).await, Some(bob));
    assert_eq!(store.selected_target(bob).await, None);

    let action = CallbackAction::parse("exit_client_selection").unwrap();
    let text = apply_selection(&store, alice, action).await.unwrap();
    assert_eq!(text.as_deref(), Some("Exited client selection."));
    assert_eq!(store.selected_target(alice).await, None);
}

#[tokio::test]
async fn test_selecting_unknown_client_fails() {
    let dir = TempDir::new().unwrap();
    let store = store_at(dir.path());
    store.authenticate(UserId(1), PASSWORD, ChatId(1)).await.unwrap();
    // wrong password: a session exists but is not a selectable client
    store.authenticate(UserId(3), "bad", ChatId(3)).await.unwrap();

    let result = apply_selection(&store, UserId(1), CallbackAction::SelectClient(UserId(3))).await;
    assert!(matches!(result, Err(BotError::UnknownClient(3))));
    assert_eq!(store.selected_target(UserId(1)).await, None);
}

#[tokio::test]
async fn test_browse_directories_are_per_session() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("logs")).unwrap();
    let root_path = root.path().canonicalize().unwrap();
    let store = store_at(&root_path);
    let (alice, bob) = (UserId(1), UserId(2));
    store.authenticate(alice, PASSWORD, ChatId(1)).await.unwrap();
    store.authenticate(bob, PASSWORD, ChatId(2)).await.unwrap();

    let process_cwd = std::env::current_dir().unwrap();
    let cwd = store.cwd(alice).await.unwrap();
    let target = files::change_dir(&cwd, "logs").unwrap();
    store.set_cwd(alice, target).await.unwrap();

    assert_eq!(store.cwd(alice).await.unwrap(), root_path.join("logs"));
    assert_eq!(store.cwd(bob).await.unwrap(), root_path);
    assert_eq!(std::env::current_dir().unwrap(), process_cwd);
}

#[test]
fn test_callback_payloads() {
    assert_eq!(
        CallbackAction::parse("select_client_42"),
        Some(CallbackAction::SelectClient(UserId(42)))
    );
    assert_eq!(CallbackAction::parse("30"), Some(CallbackAction::Record(30)));
    assert_eq!(CallbackAction::parse("31"), None);
    assert_eq!(CallbackAction::parse("garbage"), None);
}
