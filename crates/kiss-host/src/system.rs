//! Host operating system metadata.

use std::fmt;

use crate::process::query;

/// Placeholder for fields the host cannot report.
pub const UNKNOWN: &str = "unknown";

/// Basic facts about the host machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub system: String,
    pub username: String,
    pub node_name: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub processor: String,
    pub cpu_cores: Option<usize>,
}

impl SystemInfo {
    /// Collect system information.
    ///
    /// Never fails: anything that cannot be determined is reported as
    /// [`UNKNOWN`]. Blocking, since it may spawn `uname`.
    pub fn collect() -> Self {
        let uname = |flag: &str| query("uname", &[flag]);

        Self {
            system: uname("-s").unwrap_or_else(|| capitalize(std::env::consts::OS)),
            username: current_username().unwrap_or_else(|| UNKNOWN.to_string()),
            node_name: uname("-n")
                .or_else(|| query("hostname", &[]))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            release: uname("-r").unwrap_or_else(|| UNKNOWN.to_string()),
            version: uname("-v").unwrap_or_else(|| UNKNOWN.to_string()),
            machine: uname("-m").unwrap_or_else(|| std::env::consts::ARCH.to_string()),
            processor: uname("-p")
                .filter(|p| p != UNKNOWN)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            cpu_cores: std::thread::available_parallelism().ok().map(|n| n.get()),
        }
    }
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System: {}", self.system)?;
        writeln!(f, "Username: {}", self.username)?;
        writeln!(f, "Node Name: {}", self.node_name)?;
        writeln!(f, "Release: {}", self.release)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Machine: {}", self.machine)?;
        writeln!(f, "Processor: {}", self.processor)?;
        match self.cpu_cores {
            Some(n) => write!(f, "CPU Cores: {}", n),
            None => write!(f, "CPU Cores: {}", UNKNOWN),
        }
    }
}

/// Name of the user the agent runs as.
fn current_username() -> Option<String> {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .or_else(|| query("whoami", &[]))
}

/// Host name, as `hostname` or `uname -n` report it.
pub fn hostname() -> Option<String> {
    query("hostname", &[]).or_else(|| query("uname", &["-n"]))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_never_empty() {
        let info = SystemInfo::collect();
        assert!(!info.system.is_empty());
        assert!(!info.username.is_empty());
        assert!(!info.machine.is_empty());
    }

    #[test]
    fn test_display_uses_placeholder() {
        let info = SystemInfo {
            system: "Linux".to_string(),
            username: "ops".to_string(),
            node_name: "box".to_string(),
            release: "6.1".to_string(),
            version: "#1 SMP".to_string(),
            machine: "x86_64".to_string(),
            processor: UNKNOWN.to_string(),
            cpu_cores: None,
        };

        let text = info.to_string();
        assert!(text.starts_with("System: Linux\n"));
        assert!(text.contains("Processor: unknown"));
        assert!(text.ends_with("CPU Cores: unknown"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("linux"), "Linux");
        assert_eq!(capitalize(""), UNKNOWN);
    }
}
