//! Filesystem browsing and file retrieval.
//!
//! Nothing here touches the process working directory: every operation takes
//! the caller's current directory explicitly and resolves relative paths
//! against it.

use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{HostError, Result};

/// Maximum number of bytes returned by [`read_excerpt`].
pub const READ_CAP: usize = 4000;

/// Appended to an excerpt when the file was longer than the cap.
pub const TRUNCATION_MARKER: &str = "\n... (file truncated)";

/// Largest file [`fetch_target`] accepts (the bot API upload limit).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntryKind::Directory => write!(f, "📁 {}/", self.name),
            EntryKind::File => write!(f, "📄 {}", self.name),
        }
    }
}

/// Contents of a directory, directories first, then by name.
#[derive(Debug, Clone)]
pub struct DirListing {
    pub path: PathBuf,
    pub entries: Vec<Entry>,
}

impl fmt::Display for DirListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contents of {}:\n\n", self.path.display())?;
        if self.entries.is_empty() {
            return write!(f, "(empty)");
        }
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// The head of a text file.
#[derive(Debug, Clone)]
pub struct FileExcerpt {
    pub path: PathBuf,
    pub content: String,
    pub truncated: bool,
}

impl fmt::Display for FileExcerpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contents of {}:\n\n{}", self.path.display(), self.content)?;
        if self.truncated {
            f.write_str(TRUNCATION_MARKER)?;
        }
        Ok(())
    }
}

/// Resolve an operator-supplied path against `cwd`, expanding `~`.
pub fn resolve(cwd: &Path, arg: &str) -> PathBuf {
    let expanded = shellexpand::tilde(arg.trim());
    let path = Path::new(expanded.as_ref());
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn map_io(path: &Path, e: std::io::Error) -> HostError {
    if e.kind() == ErrorKind::NotFound {
        HostError::NotFound(path.to_path_buf())
    } else {
        HostError::io(path, e)
    }
}

/// List a directory. Blocking.
pub fn list_dir(path: &Path) -> Result<DirListing> {
    let meta = fs::metadata(path).map_err(|e| map_io(path, e))?;
    if !meta.is_dir() {
        return Err(HostError::NotADirectory(path.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| map_io(path, e))? {
        let entry = entry.map_err(|e| HostError::io(path, e))?;
        // follows symlinks, so a link to a directory lists as a directory
        let kind = if entry.path().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(Entry {
            name: entry.file_name().to_string_lossy().to_string(),
            kind,
        });
    }

    entries.sort_by(|a, b| {
        let rank = |e: &Entry| (e.kind != EntryKind::Directory, e.name.to_lowercase());
        rank(a).cmp(&rank(b))
    });

    debug!(path = %path.display(), count = entries.len(), "directory listed");
    Ok(DirListing {
        path: path.to_path_buf(),
        entries,
    })
}

/// Resolve the target of a `cd` and return its canonical path. Blocking.
pub fn change_dir(cwd: &Path, arg: &str) -> Result<PathBuf> {
    let target = resolve(cwd, arg);
    let canonical = fs::canonicalize(&target).map_err(|e| map_io(&target, e))?;
    if !canonical.is_dir() {
        return Err(HostError::NotADirectory(canonical));
    }
    Ok(canonical)
}

/// Read at most `cap` bytes from the start of a file. Blocking.
///
/// `truncated` is set only when the file holds more than `cap` bytes. The
/// content is a byte prefix of the file, shortened by at most three bytes
/// when the cap splits a character.
///
/// # Errors
///
/// Returns `HostError::NotText` for content that is not UTF-8.
pub fn read_excerpt(path: &Path, cap: usize) -> Result<FileExcerpt> {
    if path.is_dir() {
        return Err(HostError::NotAFile(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| map_io(path, e))?;
    let mut buf = Vec::with_capacity(cap.min(64 * 1024) + 1);
    file.take(cap as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(|e| HostError::io(path, e))?;

    let truncated = buf.len() > cap;
    buf.truncate(cap);

    Ok(FileExcerpt {
        path: path.to_path_buf(),
        content: decode_prefix(path, buf)?,
        truncated,
    })
}

/// Decode a byte prefix of a text file.
///
/// A multibyte character cut off at the end is dropped, so the result is
/// always an exact byte prefix. Anything else that is not UTF-8 is rejected.
fn decode_prefix(path: &Path, mut buf: Vec<u8>) -> Result<String> {
    if let Err(e) = std::str::from_utf8(&buf) {
        if e.error_len().is_some() {
            return Err(HostError::NotText(path.to_path_buf()));
        }
        buf.truncate(e.valid_up_to());
    }
    String::from_utf8(buf).map_err(|_| HostError::NotText(path.to_path_buf()))
}

/// Check that a path names a regular file small enough to upload. Blocking.
pub fn fetch_target(path: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(path).map_err(|e| map_io(path, e))?;
    if !meta.is_file() {
        return Err(HostError::NotAFile(path.to_path_buf()));
    }
    if meta.len() > MAX_UPLOAD_BYTES {
        return Err(HostError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(path.to_path_buf())
}
