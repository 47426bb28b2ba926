//! Error types for host operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while touching the host machine.
#[derive(Error, Debug)]
pub enum HostError {
    /// Path does not exist.
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    /// Path exists but is not a directory.
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Path exists but is not a regular file.
    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    /// File content is not UTF-8 text.
    #[error("{} is not a text file", .0.display())]
    NotText(PathBuf),

    /// File exceeds the upload limit.
    #[error("{} is {size} bytes, limit is {limit} bytes", .path.display())]
    TooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// I/O error on a specific path.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No usable external tool was found in PATH.
    #[error("no {0} tool found in PATH")]
    ToolNotFound(&'static str),

    /// External tool exited with a failure status.
    #[error("{tool} failed: {stderr}")]
    CommandFailed { tool: String, stderr: String },

    /// External tool succeeded but produced nothing.
    #[error("{0} produced no output")]
    EmptyCapture(String),

    /// Recording duration is not one of the offered choices.
    #[error("recording duration {0}s is not offered")]
    DurationNotOffered(u32),

    /// WAV encoding or decoding failed.
    #[error("wav error: {0}")]
    Wav(String),

    /// Interface enumeration or name resolution failed.
    #[error("network error: {0}")]
    Network(String),

    /// Public IP lookup failed.
    #[error("http error: {0}")]
    Http(String),

    /// I/O error not tied to a path.
    #[error("io error: {0}")]
    Other(#[from] std::io::Error),
}

impl HostError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HostError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<hound::Error> for HostError {
    fn from(e: hound::Error) -> Self {
        HostError::Wav(e.to_string())
    }
}

impl From<reqwest::Error> for HostError {
    fn from(e: reqwest::Error) -> Self {
        HostError::Http(e.to_string())
    }
}

/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, HostError>;
