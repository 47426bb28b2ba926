//! Host operations for KISS Controller.
//!
//! This crate holds everything the agent does to the machine it runs on,
//! independent of the chat transport:
//! - System and network information
//! - Screen capture and audio recording through external tools
//! - Directory listing, file excerpts and file retrieval
//!
//! All functions here are blocking. Callers in async code should run them on
//! a blocking thread.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use kiss_host::{files, SystemInfo};
//!
//! println!("{}", SystemInfo::collect());
//!
//! let listing = files::list_dir(Path::new("/tmp")).unwrap();
//! println!("{}", listing);
//!
//! let excerpt = files::read_excerpt(Path::new("/etc/hostname"), files::READ_CAP).unwrap();
//! println!("{}", excerpt);
//! ```
//!
//! # Capture backends
//!
//! Screenshots use the first of `screencapture`, `grim`, `gnome-screenshot`,
//! `scrot` or `import` found in PATH. Recordings use `arecord` or sox's `rec`.

pub mod audio;
pub mod error;
pub mod files;
pub mod network;
pub mod process;
pub mod screen;
pub mod system;

pub use audio::{Recorder, Recording, RECORD_DURATIONS};
pub use error::{HostError, Result};
pub use network::NetworkInfo;
pub use screen::{ScreenCapturer, Screenshot};
pub use system::SystemInfo;
