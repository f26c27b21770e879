use std::fmt::Write as _;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::ToolError;
use crate::tools::resolve;

/// Recursion bound for the tree listing.
pub const MAX_LS_DEPTH: usize = 3;

/// Entry bound so huge trees cannot produce unbounded output.
pub const MAX_LS_ENTRIES: usize = 200;

/// Tree-structured listing of a directory, bounded in depth and entry count.
pub fn ls(cwd: &Path, path: Option<&str>) -> Result<String, ToolError> {
    let base = match path {
        Some(p) => resolve(cwd, p),
        None => cwd.to_path_buf(),
    };
    if !base.exists() {
        return Err(ToolError::NotFound(base));
    }
    if !base.is_dir() {
        return Err(ToolError::NotADirectory(base));
    }

    let mut out = format!("{}/\n", base.display());
    let mut entries = 0usize;
    let mut truncated = false;

    for entry in WalkDir::new(&base)
        .min_depth(1)
        .max_depth(MAX_LS_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
    {
        if entries >= MAX_LS_ENTRIES {
            truncated = true;
            break;
        }
        let indent = "  ".repeat(entry.depth());
        let name = entry.file_name().to_string_lossy();
        let suffix = if entry.file_type().is_dir() { "/" } else { "" };
        let _ = writeln!(out, "{indent}{name}{suffix}");
        entries += 1;
    }

    if truncated {
        let _ = writeln!(
            out,
            "... (more than {MAX_LS_ENTRIES} entries; pass a deeper path to see more)"
        );
    }
    Ok(out)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}
