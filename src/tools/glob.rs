use std::path::Path;

use crate::error::ToolError;
use crate::tools::resolve;

/// Maximum number of paths returned by a single glob call.
pub const MAX_GLOB_RESULTS: usize = 1000;

/// Find files matching a glob pattern (`**` recursive-descent aware) under
/// `root` (default: the working directory).
///
/// Results are sorted, so repeated calls against an unchanged tree return
/// the same sequence.
pub fn glob_files(cwd: &Path, pattern: &str, root: Option<&str>) -> Result<String, ToolError> {
    let base = match root {
        Some(r) => resolve(cwd, r),
        None => cwd.to_path_buf(),
    };
    if !base.exists() {
        return Err(ToolError::NotFound(base));
    }
    if !base.is_dir() {
        return Err(ToolError::NotADirectory(base));
    }

    let full_pattern = base.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();
    let paths = glob::glob(&full_pattern).map_err(|e| ToolError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut matches: Vec<String> = paths
        .filter_map(|entry| entry.ok())
        .map(|p| p.display().to_string())
        .collect();
    matches.sort();

    if matches.is_empty() {
        return Ok(format!("No files match pattern '{pattern}'"));
    }
    let truncated = matches.len() > MAX_GLOB_RESULTS;
    matches.truncate(MAX_GLOB_RESULTS);
    let mut out = matches.join("\n");
    if truncated {
        out.push_str(&format!(
            "\n... (truncated to the first {MAX_GLOB_RESULTS} matches)"
        ));
    }
    Ok(out)
}
