use std::path::{Path, PathBuf};

use crate::error::ToolError;
use crate::tools::resolve;

/// Validate `path` and return the new canonical working directory.
///
/// The caller commits the change only on `Ok`; on failure the prior working
/// directory stands. There is no process-wide `chdir` -- the working
/// directory is explicit context threaded through every tool call.
pub fn cd(cwd: &Path, path: &str) -> Result<PathBuf, ToolError> {
    let target = resolve(cwd, path);
    if !target.exists() {
        return Err(ToolError::NotFound(target));
    }
    if !target.is_dir() {
        return Err(ToolError::NotADirectory(target));
    }
    Ok(std::fs::canonicalize(&target)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn valid_directory_is_canonicalized() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        let new_cwd = cd(tmp.path(), "sub").unwrap();
        assert_eq!(new_cwd, std::fs::canonicalize(tmp.path().join("sub")).unwrap());
    }

    #[test]
    fn missing_target_is_not_found() {
        let tmp = TempDir::new().unwrap();
        match cd(tmp.path(), "missing") {
            Err(ToolError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn file_target_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("f.txt"), "").unwrap();
        match cd(tmp.path(), "f.txt") {
            Err(ToolError::NotADirectory(_)) => {}
            other => panic!("expected NotADirectory, got {other:?}"),
        }
    }

    #[test]
    fn relative_parent_navigation_works() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let back = cd(&sub, "..").unwrap();
        assert_eq!(back, std::fs::canonicalize(tmp.path()).unwrap());
    }
}
