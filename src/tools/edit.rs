use std::path::Path;

use crate::error::ToolError;
use crate::tools::{atomic_write, resolve};

/// Replace exactly one occurrence of `old_string` in the file with
/// `new_string`, leaving every other byte unchanged.
///
/// Fails with [`ToolError::NoMatch`] on zero occurrences and
/// [`ToolError::AmbiguousMatch`] on two or more, so an edit can never apply
/// in the wrong place. The file is untouched on any failure.
pub fn edit(
    cwd: &Path,
    path: &str,
    old_string: &str,
    new_string: &str,
) -> Result<String, ToolError> {
    let full = resolve(cwd, path);
    if !full.exists() {
        return Err(ToolError::NotFound(full));
    }
    if full.is_dir() {
        return Err(ToolError::NotAFile(full));
    }

    let content = std::fs::read_to_string(&full)?;
    let count = content.matches(old_string).count();
    match count {
        0 => Err(ToolError::NoMatch(full)),
        1 => {
            let updated = content.replacen(old_string, new_string, 1);
            atomic_write(&full, &updated)?;
            Ok(format!("Edited {}", full.display()))
        }
        _ => Err(ToolError::AmbiguousMatch { path: full, count }),
    }
}
