//! Session store and authentication gate.
//!
//! The store owns every operator's [`Session`] behind a single lock. Callers
//! only get copies or atomic updates; the map itself is never handed out.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use teloxide::types::{ChatId, UserId};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::{password_matches, LoginOutcome, LoginPolicy};
use crate::error::{BotError, Result};
use crate::session::Session;

/// In-memory sessions keyed by operator.
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Session>>,
    password: String,
    policy: LoginPolicy,
    /// Browse directory for new sessions.
    default_cwd: PathBuf,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new(password: impl Into<String>, policy: LoginPolicy, default_cwd: PathBuf) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            password: password.into(),
            policy,
            default_cwd,
        }
    }

    /// Handle a `/login` attempt.
    ///
    /// A correct password creates or overwrites the session as authenticated.
    /// A wrong one leaves the authenticated flag as it was; a session record
    /// is still created so the attempt can be counted.
    ///
    /// # Errors
    ///
    /// Returns `BotError::LockedOut` while a lockout is active, or when this
    /// attempt exhausts the allowance.
    pub async fn authenticate(
        &self,
        operator: UserId,
        supplied: &str,
        chat_id: ChatId,
    ) -> Result<LoginOutcome> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(remaining) = sessions.get(&operator).and_then(|s| s.lockout_remaining(now)) {
            warn!(operator = operator.0, "Login refused during lockout");
            return Err(BotError::LockedOut {
                remaining_secs: remaining.as_secs().max(1),
            });
        }

        let session = sessions
            .entry(operator)
            .or_insert_with(|| Session::new(chat_id, self.default_cwd.clone()));

        if password_matches(supplied, &self.password) {
            session.record_success(chat_id);
            info!(operator = operator.0, chat_id = %chat_id, "Operator authenticated");
            return Ok(LoginOutcome::Authenticated);
        }

        let attempts_left = session.record_failure(&self.policy, now);
        warn!(operator = operator.0, attempts_left = ?attempts_left, "Incorrect password");
        if attempts_left == Some(0) {
            return Err(BotError::LockedOut {
                remaining_secs: self.policy.lockout.as_secs().max(1),
            });
        }
        Ok(LoginOutcome::Rejected { attempts_left })
    }

    /// Gate for every command except `/login`.
    ///
    /// A missing session and an unauthenticated one are rejected alike.
    pub async fn require_authenticated(&self, operator: UserId) -> Result<()> {
        if self.is_authenticated(operator).await {
            Ok(())
        } else {
            debug!(operator = operator.0, "Unauthenticated request rejected");
            Err(BotError::NotAuthenticated)
        }
    }

    /// Whether the operator has an authenticated session.
    pub async fn is_authenticated(&self, operator: UserId) -> bool {
        self.sessions
            .read()
            .await
            .get(&operator)
            .map(|s| s.authenticated)
            .unwrap_or(false)
    }

    /// Chat the operator logged in from.
    pub async fn chat_id(&self, operator: UserId) -> Option<ChatId> {
        self.sessions.read().await.get(&operator).map(|s| s.chat_id)
    }

    /// Authenticated operators, ordered by id.
    pub async fn authenticated_operators(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, s)| s.authenticated)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_by_key(|id| id.0);
        ids
    }

    /// Point the operator's session at another client.
    ///
    /// The target must have an authenticated session at the moment of the
    /// call; the check and the update happen under one lock.
    pub async fn select_target(&self, operator: UserId, target: UserId) -> Result<()> {
        let mut sessions = self.sessions.write().await;

        let target_known = sessions
            .get(&target)
            .map(|s| s.authenticated)
            .unwrap_or(false);
        if !target_known {
            return Err(BotError::UnknownClient(target.0));
        }

        let session = authenticated_mut(&mut sessions, operator)?;
        session.selected_target = Some(target);
        debug!(operator = operator.0, target = target.0, "Client selected");
        Ok(())
    }

    /// Drop the operator's client selection.
    pub async fn clear_target(&self, operator: UserId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        authenticated_mut(&mut sessions, operator)?.selected_target = None;
        debug!(operator = operator.0, "Client selection cleared");
        Ok(())
    }

    /// Client the operator currently has selected.
    pub async fn selected_target(&self, operator: UserId) -> Option<UserId> {
        self.sessions
            .read()
            .await
            .get(&operator)
            .and_then(|s| s.selected_target)
    }

    /// Operator's browse directory.
    pub async fn cwd(&self, operator: UserId) -> Result<PathBuf> {
        let sessions = self.sessions.read().await;
        match sessions.get(&operator) {
            Some(s) if s.authenticated => Ok(s.cwd.clone()),
            _ => Err(BotError::NotAuthenticated),
        }
    }

    /// Move the operator's browse directory.
    pub async fn set_cwd(&self, operator: UserId, cwd: PathBuf) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        authenticated_mut(&mut sessions, operator)?.cwd = cwd;
        Ok(())
    }

    /// Number of sessions, authenticated or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn authenticated_mut(
    sessions: &mut HashMap<UserId, Session>,
    operator: UserId,
) -> Result<&mut Session> {
    match sessions.get_mut(&operator) {
        Some(s) if s.authenticated => Ok(s),
        _ => Err(BotError::NotAuthenticated),
    }
}
