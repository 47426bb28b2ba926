//! Per-operator session state.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use teloxide::types::{ChatId, UserId};

use crate::auth::LoginPolicy;

/// An operator's session with the agent.
#[derive(Debug, Clone)]
pub struct Session {
    /// Chat that asynchronous replies go to.
    pub chat_id: ChatId,
    /// Set once a correct password has been submitted.
    pub authenticated: bool,
    /// Client picked from the `/clients` menu.
    pub selected_target: Option<UserId>,
    /// Directory that relative browse paths resolve against.
    pub cwd: PathBuf,
    /// Consecutive wrong passwords since the last success or lockout.
    failed_logins: u32,
    /// Logins are refused until this instant.
    locked_until: Option<Instant>,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new(chat_id: ChatId, cwd: PathBuf) -> Self {
        Self {
            chat_id,
            authenticated: false,
            selected_target: None,
            cwd,
            failed_logins: 0,
            locked_until: None,
        }
    }

    /// Time left on a login lockout, if one is active at `now`.
    pub fn lockout_remaining(&self, now: Instant) -> Option<Duration> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| until - now)
    }

    /// Number of wrong passwords counted so far.
    pub fn failed_logins(&self) -> u32 {
        self.failed_logins
    }

    /// Mark the session authenticated after a correct password.
    pub(crate) fn record_success(&mut self, chat_id: ChatId) {
        self.chat_id = chat_id;
        self.authenticated = true;
        self.failed_logins = 0;
        self.locked_until = None;
    }

    /// Count a wrong password and return how many attempts remain.
    ///
    /// Reaching the limit starts a lockout and resets the counter. Returns
    /// `None` when the policy does not throttle.
    pub(crate) fn record_failure(&mut self, policy: &LoginPolicy, now: Instant) -> Option<u32> {
        if !policy.is_throttled() {
            return None;
        }

        self.failed_logins += 1;
        if self.failed_logins >= policy.max_attempts {
            self.failed_logins = 0;
            self.locked_until = Some(now + policy.lockout);
            return Some(0);
        }
        Some(policy.max_attempts - self.failed_logins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(ChatId(42), PathBuf::from("/"))
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.chat_id.0, 42);
        assert!(!s.authenticated);
        assert!(s.selected_target.is_none());
        assert_eq!(s.cwd, PathBuf::from("/"));
        assert_eq!(s.failed_logins(), 0);
        assert!(s.lockout_remaining(Instant::now()).is_none());
    }

    #[test]
    fn test_failures_lead_to_lockout() {
        let policy = LoginPolicy {
            max_attempts: 3,
            lockout: Duration::from_secs(60),
        };
        let now = Instant::now();
        let mut s = session();

        assert_eq!(s.record_failure(&policy, now), Some(2));
        assert_eq!(s.record_failure(&policy, now), Some(1));
        assert_eq!(s.record_failure(&policy, now), Some(0));

        let remaining = s.lockout_remaining(now).expect("locked out");
        assert_eq!(remaining, Duration::from_secs(60));
        assert!(s.lockout_remaining(now + Duration::from_secs(61)).is_none());
        assert!(!s.authenticated);
    }

    #[test]
    fn test_success_resets_counters() {
        let policy = LoginPolicy::default();
        let mut s = session();
        s.record_failure(&policy, Instant::now());
        assert_eq!(s.failed_logins(), 1);

        s.record_success(ChatId(7));
        assert!(s.authenticated);
        assert_eq!(s.chat_id.0, 7);
        assert_eq!(s.failed_logins(), 0);
    }

    #[test]
    fn test_unthrottled_never_locks() {
        let policy = LoginPolicy::unlimited();
        let now = Instant::now();
        let mut s = session();
        for _ in 0..100 {
            assert_eq!(s.record_failure(&policy, now), None);
        }
        assert!(s.lockout_remaining(now).is_none());
    }
}
