//! External tool discovery and invocation.

use std::path::PathBuf;
use std::process::{Command, Output};

use tracing::{debug, trace};

use crate::{HostError, Result};

/// An external program located in PATH.
#[derive(Debug, Clone)]
pub struct Tool {
    /// Short name, used in logs and errors.
    pub name: &'static str,
    /// Resolved binary path.
    pub path: PathBuf,
}

impl Tool {
    /// Locate a binary by name.
    pub fn find(name: &'static str) -> Option<Self> {
        let path = which::which(name).ok()?;
        debug!(tool = name, path = %path.display(), "tool found");
        Some(Self { name, path })
    }

    /// Locate the first available binary from an ordered list of candidates.
    pub fn first_of(candidates: &[&'static str]) -> Option<Self> {
        candidates.iter().find_map(|name| Self::find(name))
    }

    /// Run the tool and return its raw output.
    pub fn run(&self, args: &[&str]) -> Result<Output> {
        trace!(tool = self.name, args = ?args, "running tool");
        let output = Command::new(&self.path).args(args).output()?;
        trace!(
            tool = self.name,
            status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "tool completed"
        );
        Ok(output)
    }

    /// Run the tool and fail on a non-zero exit status.
    pub fn run_checked(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.run(args)?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(HostError::CommandFailed {
                tool: self.name.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Run a tool by name and return trimmed stdout, or `None` on any failure.
pub(crate) fn query(name: &'static str, args: &[&str]) -> Option<String> {
    let tool = Tool::find(name)?;
    let stdout = tool.run_checked(args).ok()?;
    let text = String::from_utf8_lossy(&stdout).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
