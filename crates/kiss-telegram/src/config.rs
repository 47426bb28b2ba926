//! Bot configuration, read from the environment.
//!
//! # Environment Variables
//!
//! Required:
//! - `KISS_BOT_TOKEN` (or legacy `TOKENY`): bot token from @BotFather
//! - `KISS_PASSWORD` (or legacy `PASSY`): shared operator password, with
//!   surrounding whitespace trimmed
//!
//! Optional:
//! - `KISS_LOGIN_MAX_ATTEMPTS`: failed logins before lockout, `0` disables (default: 5)
//! - `KISS_LOGIN_LOCKOUT_SECS`: lockout window in seconds (default: 300)
//! - `KISS_PUBLIC_IP_LOOKUP`: query a public IP service in `/network` (default: true)
//! - `KISS_PUBLIC_IP_URL`: public IP service (default: ipify)
//! - `KISS_MAX_WORKERS`: concurrent blocking jobs (default: 3)
//! - `KISS_CONFIG_DIR`: directory holding the `.env` file

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use kiss_host::network::DEFAULT_PUBLIC_IP_URL;

use crate::auth::{LoginPolicy, DEFAULT_LOCKOUT, DEFAULT_MAX_ATTEMPTS};
use crate::error::{BotError, Result};

pub const TOKEN_ENV: &str = "KISS_BOT_TOKEN";
pub const LEGACY_TOKEN_ENV: &str = "TOKENY";
pub const PASSWORD_ENV: &str = "KISS_PASSWORD";
pub const LEGACY_PASSWORD_ENV: &str = "PASSY";
pub const MAX_ATTEMPTS_ENV: &str = "KISS_LOGIN_MAX_ATTEMPTS";
pub const LOCKOUT_SECS_ENV: &str = "KISS_LOGIN_LOCKOUT_SECS";
pub const PUBLIC_IP_LOOKUP_ENV: &str = "KISS_PUBLIC_IP_LOOKUP";
pub const PUBLIC_IP_URL_ENV: &str = "KISS_PUBLIC_IP_URL";
pub const MAX_WORKERS_ENV: &str = "KISS_MAX_WORKERS";

/// Environment variable for a custom config directory.
pub const CONFIG_DIR_ENV: &str = "KISS_CONFIG_DIR";

/// Default config directory name under the platform config dir.
const DEFAULT_CONFIG_DIR: &str = "kisscontroller";

const DEFAULT_MAX_WORKERS: usize = 3;

/// Settings the bot needs at startup.
#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub password: String,
    pub login_policy: LoginPolicy,
    /// Public IP service, or `None` when the lookup is disabled.
    pub public_ip_url: Option<String>,
    pub max_workers: usize,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("password", &"<redacted>")
            .field("login_policy", &self.login_policy)
            .field("public_ip_url", &self.public_ip_url)
            .field("max_workers", &self.max_workers)
            .finish()
    }
}

impl BotConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Missing or malformed token, missing password, or an optional setting
    /// that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get(TOKEN_ENV)
            .or_else(|| get(LEGACY_TOKEN_ENV))
            .ok_or(BotError::NoToken)?;
        if !validate_token(&token) {
            return Err(BotError::InvalidToken);
        }

        // trimmed like the `/login` argument it is compared against
        let password = get(PASSWORD_ENV)
            .or_else(|| get(LEGACY_PASSWORD_ENV))
            .ok_or(BotError::NoPassword)?;

        let max_attempts = parse_setting(get(MAX_ATTEMPTS_ENV), MAX_ATTEMPTS_ENV, DEFAULT_MAX_ATTEMPTS)?;
        let lockout_secs = parse_setting(
            get(LOCKOUT_SECS_ENV),
            LOCKOUT_SECS_ENV,
            DEFAULT_LOCKOUT.as_secs(),
        )?;
        let lookup_public_ip = parse_bool(get(PUBLIC_IP_LOOKUP_ENV), PUBLIC_IP_LOOKUP_ENV, true)?;
        let max_workers: usize = parse_setting(get(MAX_WORKERS_ENV), MAX_WORKERS_ENV, DEFAULT_MAX_WORKERS)?;
        if max_workers == 0 {
            return Err(BotError::InvalidSetting {
                key: MAX_WORKERS_ENV,
                value: "0".to_string(),
            });
        }

        let public_ip_url = lookup_public_ip
            .then(|| get(PUBLIC_IP_URL_ENV).unwrap_or_else(|| DEFAULT_PUBLIC_IP_URL.to_string()));

        Ok(Self {
            token,
            password,
            login_policy: LoginPolicy {
                max_attempts,
                lockout: Duration::from_secs(lockout_secs),
            },
            public_ip_url,
            max_workers,
        })
    }
}

/// Minimal sanity check: exactly one `:` with something on both sides.
pub fn validate_token(token: &str) -> bool {
    match token.split_once(':') {
        Some((id, secret)) => !id.is_empty() && !secret.is_empty() && !secret.contains(':'),
        None => false,
    }
}

fn parse_setting<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| BotError::InvalidSetting { key, value }),
        None => Ok(default),
    }
}

fn parse_bool(raw: Option<String>, key: &'static str, default: bool) -> Result<bool> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BotError::InvalidSetting { key, value }),
    }
}

/// Directory holding the bot's `.env` file.
///
/// Determined by:
/// 1. `KISS_CONFIG_DIR` environment variable if set
/// 2. `<platform config dir>/kisscontroller`
/// 3. `.kisscontroller` in the current directory as fallback
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::config_dir()
                .map(|d| d.join(DEFAULT_CONFIG_DIR))
                .unwrap_or_else(|| PathBuf::from(format!(".{}", DEFAULT_CONFIG_DIR)))
        })
}

/// Path to the `.env` file in the config directory.
pub fn env_file() -> PathBuf {
    config_dir().join(".env")
}
