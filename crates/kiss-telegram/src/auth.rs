//! Password checking and login throttling policy.

use std::time::Duration;

/// Default number of failed logins before lockout.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout window.
pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(300);

/// How many wrong passwords an operator may submit before being locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    /// Failed attempts allowed before lockout. `0` disables throttling.
    pub max_attempts: u32,
    /// How long a locked-out operator must wait.
    pub lockout: Duration,
}

impl LoginPolicy {
    /// A policy that never locks anyone out.
    pub fn unlimited() -> Self {
        Self {
            max_attempts: 0,
            lockout: Duration::ZERO,
        }
    }

    /// Whether failed attempts are counted at all.
    pub fn is_throttled(&self) -> bool {
        self.max_attempts > 0
    }
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout: DEFAULT_LOCKOUT,
        }
    }
}

/// Result of a `/login` attempt that was not locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Password matched; the session is authenticated.
    Authenticated,
    /// Password did not match. `attempts_left` is `None` when unthrottled.
    Rejected { attempts_left: Option<u32> },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated)
    }
}

/// Exact password comparison that does not stop at the first differing byte.
pub fn password_matches(supplied: &str, expected: &str) -> bool {
    let (a, b) = (supplied.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_matches_exactly() {
        assert!(password_matches("hunter2", "hunter2"));
        assert!(!password_matches("hunter3", "hunter2"));
        assert!(!password_matches("hunter2 ", "hunter2"));
        assert!(!password_matches("Hunter2", "hunter2"));
        assert!(!password_matches("", "hunter2"));
    }

    #[test]
    fn test_policy_defaults() {
        let policy = LoginPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.lockout, Duration::from_secs(300));
        assert!(policy.is_throttled());
        assert!(!LoginPolicy::unlimited().is_throttled());
    }

    #[test]
    fn test_outcome_success() {
        assert!(LoginOutcome::Authenticated.is_success());
        assert!(!LoginOutcome::Rejected { attempts_left: Some(2) }.is_success());
    }
}
