//! Managed hosts-file section rewriting.
//!
//! The hosts file belongs to the host system; this module owns exactly one
//! delimited block inside it. Each render takes an exclusive advisory lock
//! on the whole file, removes the previous block (markers included), and
//! writes a fresh one in its place. Everything outside the markers is kept,
//! modulo per-line trailing-whitespace normalization.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs4::FileExt;

use crate::error::{DnsthingError, Result};
use crate::registry::HostEntry;

/// First line of the managed section.
pub const SECTION_START: &str = "# === start dnsthing ===";

/// Last line of the managed section.
pub const SECTION_END: &str = "# === end dnsthing ===";

/// Rewrites the managed section of a shared hosts file.
///
/// Other processes may write the same file; every render holds a blocking
/// exclusive `flock` across the full read-modify-write. The lock is
/// released explicitly on success and by descriptor close on every other
/// exit path, so an error inside the critical section cannot leave the
/// file locked.
///
/// # Example
///
/// ```rust,ignore
/// use dnsthing::HostsFile;
///
/// let hosts = HostsFile::new("/etc/hosts.docker", "docker");
/// hosts.render(&registry.snapshot())?;
/// ```
#[derive(Debug, Clone)]
pub struct HostsFile {
    path: PathBuf,
    domain: String,
}

impl HostsFile {
    /// Creates an editor for the hosts file at `path`, qualifying names
    /// with `domain` (`<name>.<network>.<domain>`).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, domain: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            domain: domain.into(),
        }
    }

    /// Path of the managed file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the managed section with one line per entry.
    ///
    /// The file must already exist; it is owned by the host system and is
    /// never created here. A previous managed section is replaced in
    /// place; if the markers are missing or malformed, the section is
    /// appended after the existing content instead.
    ///
    /// # Errors
    ///
    /// Returns [`DnsthingError::HostsFileNotFound`] if the file does not
    /// exist, and [`DnsthingError::Io`] if locking, reading, or rewriting
    /// fails.
    pub fn render(&self, entries: &[HostEntry]) -> Result<()> {
        tracing::info!(
            path = %self.path.display(),
            entries = entries.len(),
            "writing hosts file"
        );

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DnsthingError::HostsFileNotFound {
                        path: self.path.display().to_string(),
                    }
                } else {
                    DnsthingError::Io(e)
                }
            })?;

        file.lock_exclusive()?;
        let result = self.rewrite_locked(&mut file, entries);
        if result.is_ok() {
            file.unlock()?;
        }
        result
    }

    fn rewrite_locked(&self, file: &mut std::fs::File, entries: &[HostEntry]) -> Result<()> {
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let section: Vec<String> = entries
            .iter()
            .map(|entry| format_entry(entry, &self.domain))
            .collect();
        let updated = splice_section(&content, &section);

        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(updated.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Formats one hosts line: `<address> <name>.<network>.<domain>`.
fn format_entry(entry: &HostEntry, domain: &str) -> String {
    format!(
        "{} {}.{}.{}",
        entry.address, entry.name, entry.network, domain
    )
}

/// Replaces the managed section inside `content` with `section_body`.
///
/// Lines are right-trimmed. When both markers are present in order, the
/// inclusive range between them is replaced where it sits; otherwise
/// (no markers, a lone marker, or end before start) the old content is
/// kept whole and a fresh section is appended after it.
fn splice_section(content: &str, section_body: &[String]) -> String {
    let lines: Vec<&str> = content.lines().map(str::trim_end).collect();

    let start = lines.iter().position(|line| *line == SECTION_START);
    let end = lines.iter().position(|line| *line == SECTION_END);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + section_body.len() + 2);
    let suffix: &[&str] = match (start, end) {
        (Some(s), Some(e)) if s <= e => {
            out.extend_from_slice(&lines[..s]);
            &lines[e + 1..]
        }
        _ => {
            out.extend_from_slice(&lines);
            &[]
        }
    };

    out.push(SECTION_START);
    out.extend(section_body.iter().map(String::as_str));
    out.push(SECTION_END);
    out.extend_from_slice(suffix);

    let mut result = out.join("\n");
    result.push('\n');
    result
}
