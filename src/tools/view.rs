use std::path::Path;

use crate::error::ToolError;
use crate::tools::resolve;

/// Maximum number of lines returned by a single view call.
pub const MAX_VIEW_LINES: usize = 1000;

/// Lines longer than this are truncated with an ellipsis marker.
pub const MAX_LINE_CHARS: usize = 2000;

/// Read a file and return its content with `cat -n` style line numbers.
///
/// `offset` is the 1-based line to start from; `limit` caps the number of
/// lines returned (default [`MAX_VIEW_LINES`] from the start).
pub fn view(
    cwd: &Path,
    path: &str,
    offset: Option<usize>,
    limit: Option<usize>,
) -> Result<String, ToolError> {
    let full = resolve(cwd, path);
    if !full.exists() {
        return Err(ToolError::NotFound(full));
    }
    if full.is_dir() {
        return Err(ToolError::NotAFile(full));
    }

    let content = std::fs::read_to_string(&full)?;
    let start = offset.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(MAX_VIEW_LINES).min(MAX_VIEW_LINES);

    let total_lines = content.lines().count();
    let mut out = String::new();
    let mut shown = 0usize;
    for (idx, line) in content.lines().enumerate().skip(start - 1) {
        if shown >= limit {
            break;
        }
        let rendered = if line.chars().count() > MAX_LINE_CHARS {
            let truncated: String = line.chars().take(MAX_LINE_CHARS).collect();
            format!("{truncated}... (line truncated)")
        } else {
            line.to_string()
        };
        out.push_str(&format!("{:6}\t{}\n", idx + 1, rendered));
        shown += 1;
    }

    if start > 1 && total_lines < start {
        return Ok(format!(
            "(file has only {total_lines} lines; offset {start} is past the end)"
        ));
    }
    if start - 1 + shown < total_lines {
        out.push_str(&format!(
            "... ({} more lines; use offset/limit to view them)\n",
            total_lines - (start - 1 + shown)
        ));
    }
    Ok(out)
}
