//! File/shell tools and their dispatch.
//!
//! Each file tool is a pure function of (working directory, validated
//! arguments). [`dispatch`] routes a named tool call from the model to its
//! implementation and always renders the outcome as a string -- success
//! payload or a JSON error object -- so the model can observe failures and
//! retry with adjusted arguments.
//!
//! Tools use synchronous `std::fs`: every operation is bounded in output
//! size and completes near-instantly, so no async I/O is needed here.

pub mod cd;
pub mod edit;
pub mod glob;
pub mod grep;
pub mod ls;
pub mod registry;
pub mod replace;
pub mod user_input;
pub mod view;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{json, Value};

use crate::error::{SessionError, ToolError};
use crate::exec::ShellSession;
use registry::{ToolKind, ToolRegistry};

/// Mutable per-run state shared by the tools: the working-directory context
/// and the persistent shell session. Owned by the dispatch loop and passed
/// in explicitly; there is no ambient global state.
pub struct ToolContext {
    pub workdir: PathBuf,
    pub shell: ShellSession,
    pub shell_timeout: Duration,
}

/// Resolve a tool path argument against the working directory.
/// Absolute paths are used as-is.
pub(crate) fn resolve(cwd: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        cwd.join(p)
    }
}

/// Write `content` to `path` through a same-directory temp file and rename,
/// so the target is never left partially written.
pub(crate) fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let tmp = parent.join(format!(".{}.tmp-{}", file_name, std::process::id()));
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}

fn req_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or(ToolError::BadArgument(key))
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

fn opt_usize(args: &Value, key: &str) -> Option<usize> {
    args.get(key).and_then(|v| v.as_u64()).map(|v| v as usize)
}

fn render(result: Result<String, ToolError>) -> String {
    match result {
        Ok(payload) => payload,
        Err(e) => json!({ "error": e.to_string() }).to_string(),
    }
}

/// Dispatch one tool call.
///
/// Tool-level failures (bad arguments, missing files, ambiguous edits,
/// rejected commands, timeouts) come back as the returned string. The only
/// `Err` is a [`SessionError`]: a shell interpreter that cannot be started
/// is fatal to the run and must reach the user, not the model.
pub async fn dispatch(
    registry: &ToolRegistry,
    name: &str,
    args: &Value,
    cx: &mut ToolContext,
) -> Result<String, SessionError> {
    let Some(kind) = registry.get(name) else {
        return Ok(json!({ "error": format!("Unknown tool: {name}") }).to_string());
    };

    match kind {
        ToolKind::View => Ok(render(req_str(args, "path").and_then(|path| {
            view::view(&cx.workdir, path, opt_usize(args, "offset"), opt_usize(args, "limit"))
        }))),
        ToolKind::Edit => Ok(render(
            req_str(args, "path")
                .and_then(|path| Ok((path, req_str(args, "old_string")?)))
                .and_then(|(path, old)| Ok((path, old, req_str(args, "new_string")?)))
                .and_then(|(path, old, new)| edit::edit(&cx.workdir, path, old, new)),
        )),
        ToolKind::Replace => Ok(render(
            req_str(args, "path")
                .and_then(|path| Ok((path, req_str(args, "content")?)))
                .and_then(|(path, content)| replace::replace(&cx.workdir, path, content)),
        )),
        ToolKind::Glob => Ok(render(req_str(args, "pattern").and_then(|pattern| {
            glob::glob_files(&cx.workdir, pattern, opt_str(args, "root"))
        }))),
        ToolKind::Grep => Ok(render(req_str(args, "pattern").and_then(|pattern| {
            grep::grep(
                &cx.workdir,
                pattern,
                opt_str(args, "root"),
                opt_str(args, "file_filter"),
            )
        }))),
        ToolKind::Ls => Ok(render(ls::ls(&cx.workdir, opt_str(args, "path")))),
        ToolKind::Cd => Ok(render(req_str(args, "path").and_then(|path| {
            let new_cwd = cd::cd(&cx.workdir, path)?;
            cx.workdir = new_cwd.clone();
            Ok(format!("Working directory is now {}", new_cwd.display()))
        }))),
        ToolKind::Shell(_) => match req_str(args, "command") {
            Err(e) => Ok(render(Err(e))),
            Ok(command) => {
                let timeout = opt_usize(args, "timeout")
                    .map(|secs| Duration::from_secs(secs as u64))
                    .unwrap_or(cx.shell_timeout);
                let result = cx.shell.run(command, timeout).await?;
                Ok(serde_json::to_string(&result).unwrap_or_else(|e| {
                    json!({ "error": format!("Failed to serialize shell result: {e}") })
                        .to_string()
                }))
            }
        },
        ToolKind::UserInput => match req_str(args, "prompt") {
            Err(e) => Ok(render(Err(e))),
            Ok(prompt) => Ok(user_input::user_input(prompt.to_string()).await),
        },
    }
}
