//! Shared state for the Telegram bot.

use std::path::PathBuf;
use std::sync::Arc;

use kiss_host::{HostError, Recorder, ScreenCapturer};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::store::SessionStore;

/// Shared state for the Telegram bot, accessible across all handlers.
pub struct BotState {
    /// Operator sessions.
    sessions: SessionStore,
    /// Screenshot backend, if the host has one.
    screen: Option<ScreenCapturer>,
    /// Recording backend, if the host has one.
    recorder: Option<Recorder>,
    /// HTTP client for the public IP lookup.
    http: reqwest::Client,
    /// Public IP service, `None` when disabled.
    public_ip_url: Option<String>,
    /// Bounds concurrent blocking jobs.
    workers: Semaphore,
}

impl BotState {
    /// Create the bot state, detecting the host capture tools.
    pub fn new(config: &BotConfig) -> Self {
        let default_cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));

        let screen = match ScreenCapturer::detect() {
            Ok(capturer) => Some(capturer),
            Err(e) => {
                warn!(error = %e, "Screenshots will not work");
                None
            }
        };
        let recorder = match Recorder::detect() {
            Ok(recorder) => Some(recorder),
            Err(e) => {
                warn!(error = %e, "Audio recording will not work");
                None
            }
        };

        info!(
            screen = screen.as_ref().map(ScreenCapturer::backend).unwrap_or("none"),
            recorder = recorder.as_ref().map(Recorder::backend).unwrap_or("none"),
            cwd = %default_cwd.display(),
            workers = config.max_workers,
            public_ip = config.public_ip_url.is_some(),
            "Bot state initialized"
        );

        Self {
            sessions: SessionStore::new(config.password.clone(), config.login_policy, default_cwd),
            screen,
            recorder,
            http: reqwest::Client::new(),
            public_ip_url: config.public_ip_url.clone(),
            workers: Semaphore::new(config.max_workers),
        }
    }

    /// Get a reference to the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Screenshot backend.
    pub fn screen(&self) -> Result<ScreenCapturer> {
        self.screen
            .clone()
            .ok_or(BotError::Host(HostError::ToolNotFound("screenshot")))
    }

    /// Recording backend.
    pub fn recorder(&self) -> Result<Recorder> {
        self.recorder
            .clone()
            .ok_or(BotError::Host(HostError::ToolNotFound("audio recording")))
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn public_ip_url(&self) -> Option<&str> {
        self.public_ip_url.as_deref()
    }

    /// Run a blocking host operation off the async runtime.
    ///
    /// Waits for a worker permit first, so at most `max_workers` jobs run at
    /// once.
    pub async fn offload<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> kiss_host::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|e| BotError::Worker(e.to_string()))?;
        let value = tokio::task::spawn_blocking(job).await??;
        Ok(value)
    }
}

/// Create shared state wrapped in Arc.
pub fn create_shared_state(config: &BotConfig) -> Arc<BotState> {
    Arc::new(BotState::new(config))
}
