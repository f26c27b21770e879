use std::fmt::Write as _;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::ToolError;
use crate::tools::resolve;

/// Maximum number of matching lines reported per call.
pub const MAX_GREP_MATCHES: usize = 100;

/// Matched lines longer than this are truncated.
const MAX_MATCH_LINE_CHARS: usize = 500;

/// Regex search across files under `root`, optionally restricted to file
/// names matching a glob `file_filter` (e.g. `*.rs`).
///
/// Matches are grouped by file with line numbers. A malformed regex fails
/// with [`ToolError::InvalidPattern`] instead of crashing the caller;
/// binary/non-UTF-8 files are silently skipped.
pub fn grep(
    cwd: &Path,
    pattern: &str,
    root: Option<&str>,
    file_filter: Option<&str>,
) -> Result<String, ToolError> {
    let base = match root {
        Some(r) => resolve(cwd, r),
        None => cwd.to_path_buf(),
    };
    if !base.exists() {
        return Err(ToolError::NotFound(base));
    }

    let regex = regex::Regex::new(pattern).map_err(|e| ToolError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let filter = match file_filter {
        Some(f) => Some(glob::Pattern::new(f).map_err(|e| ToolError::InvalidPattern {
            pattern: f.to_string(),
            message: e.to_string(),
        })?),
        None => None,
    };

    let mut out = String::new();
    let mut match_count = 0usize;
    let mut truncated = false;

    'files: for entry in WalkDir::new(&base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        if let Some(ref filter) = filter {
            let name = entry.file_name().to_string_lossy();
            if !filter.matches(&name) {
                continue;
            }
        }
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue; // binary or unreadable
        };

        let mut file_header_written = false;
        for (idx, line) in content.lines().enumerate() {
            if !regex.is_match(line) {
                continue;
            }
            if match_count >= MAX_GREP_MATCHES {
                truncated = true;
                break 'files;
            }
            if !file_header_written {
                let _ = writeln!(out, "{}:", entry.path().display());
                file_header_written = true;
            }
            let shown = if line.chars().count() > MAX_MATCH_LINE_CHARS {
                let cut: String = line.chars().take(MAX_MATCH_LINE_CHARS).collect();
                format!("{cut}...")
            } else {
                line.to_string()
            };
            let _ = writeln!(out, "  {}: {}", idx + 1, shown);
            match_count += 1;
        }
    }

    if match_count == 0 {
        return Ok(format!("No matches for pattern '{pattern}'"));
    }
    if truncated {
        let _ = writeln!(out, "... (truncated to the first {MAX_GREP_MATCHES} matches)");
    }
    Ok(out)
}

/// Skip dotfiles and dot-directories (.git and friends).
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}
