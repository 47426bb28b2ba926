//! Screen capture through whichever screenshot tool the host provides.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::process::Tool;
use crate::{HostError, Result};

/// Screenshot tools, in order of preference.
const BACKENDS: &[&str] = &["screencapture", "grim", "gnome-screenshot", "scrot", "import"];

/// A captured screen image on disk.
///
/// The file is removed when this value is dropped, whether or not it was
/// delivered.
#[derive(Debug)]
pub struct Screenshot {
    file: NamedTempFile,
}

impl Screenshot {
    /// Path to the PNG image.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Captures the full display to a PNG file.
#[derive(Debug, Clone)]
pub struct ScreenCapturer {
    tool: Tool,
}

impl ScreenCapturer {
    /// Find a usable screenshot tool.
    ///
    /// # Errors
    ///
    /// Returns `HostError::ToolNotFound` if none of the known tools is in PATH.
    pub fn detect() -> Result<Self> {
        let tool = Tool::first_of(BACKENDS).ok_or(HostError::ToolNotFound("screenshot"))?;
        info!(tool = tool.name, "screen capture backend selected");
        Ok(Self { tool })
    }

    /// Name of the selected tool.
    pub fn backend(&self) -> &'static str {
        self.tool.name
    }

    /// Capture the screen. Blocking.
    pub fn capture(&self) -> Result<Screenshot> {
        let file = tempfile::Builder::new()
            .prefix("kiss-screenshot-")
            .suffix(".png")
            .tempfile()?;

        let target = file.path().to_string_lossy().to_string();
        let args = capture_args(self.tool.name, &target);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.tool.run_checked(&args)?;

        // by path: some tools replace the file rather than writing into it
        let size = std::fs::metadata(file.path())
            .map_err(|e| HostError::io(file.path(), e))?
            .len();
        if size == 0 {
            return Err(HostError::EmptyCapture(self.tool.name.to_string()));
        }

        debug!(tool = self.tool.name, bytes = size, "screen captured");
        Ok(Screenshot { file })
    }
}

/// Arguments that make `tool` write a full-screen PNG to `target`.
fn capture_args(tool: &str, target: &str) -> Vec<String> {
    let args: &[&str] = match tool {
        // -x: no shutter sound
        "screencapture" => &["-x"],
        "gnome-screenshot" => &["-f"],
        // -o: overwrite the (empty) temp file instead of picking a new name
        "scrot" => &["-o"],
        "import" => &["-window", "root"],
        _ => &[],
    };

    args.iter()
        .map(|a| a.to_string())
        .chain(std::iter::once(target.to_string()))
        .collect()
}
