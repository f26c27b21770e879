//! Project memory file.
//!
//! `QUILL.md` in the working directory is a plain append-only text file: read
//! once at session start and injected verbatim into the system prompt,
//! appended to via the interactive `/remember` command. It is opaque text,
//! not a managed store.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// File name of the project memory file.
pub const MEMORY_FILE: &str = "QUILL.md";

/// Read the project memory file if present. A missing file is simply no
/// memory; any other read error is logged and treated the same way.
pub fn load(workdir: &Path) -> Option<String> {
    let path = workdir.join(MEMORY_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) if content.trim().is_empty() => None,
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// Append one note to the project memory file, creating it if needed.
pub fn append(workdir: &Path, note: &str) -> std::io::Result<()> {
    let path = workdir.join(MEMORY_FILE);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "- {}", note.trim())
}
