use std::path::Path;

use crate::error::ToolError;
use crate::tools::{atomic_write, resolve};

/// Create or fully overwrite a file with `content`, creating any missing
/// parent directories.
///
/// The write goes through a same-directory temp file plus rename, so a
/// failure mid-write leaves the original content (or its absence) intact.
pub fn replace(cwd: &Path, path: &str, content: &str) -> Result<String, ToolError> {
    let full = resolve(cwd, path);
    if full.is_dir() {
        return Err(ToolError::NotAFile(full));
    }
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let existed = full.exists();
    atomic_write(&full, content)?;
    Ok(format!(
        "{} {} ({} bytes)",
        if existed { "Overwrote" } else { "Created" },
        full.display(),
        content.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_file_and_parents() {
        let tmp = TempDir::new().unwrap();
        let msg = replace(tmp.path(), "a/b/new.txt", "hello").unwrap();
        assert!(msg.starts_with("Created"));
        let body = std::fs::read_to_string(tmp.path().join("a/b/new.txt")).unwrap();
        assert_eq!(body, "hello");
    }

    #[test]
    fn overwrites_existing_content_fully() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("f.txt"), "old old old").unwrap();
        let msg = replace(tmp.path(), "f.txt", "new").unwrap();
        assert!(msg.starts_with("Overwrote"));
        let body = std::fs::read_to_string(tmp.path().join("f.txt")).unwrap();
        assert_eq!(body, "new");
    }

    #[test]
    fn directory_target_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("d")).unwrap();
        match replace(tmp.path(), "d", "x") {
            Err(ToolError::NotAFile(_)) => {}
            other => panic!("expected NotAFile, got {other:?}"),
        }
    }
}
