//! Persistent shell session.
//!
//! Owns one long-lived interpreter subprocess per agent run and issues
//! commands to it over stdin, so shell state (working directory, exported
//! variables) persists across calls -- the way a human uses an interactive
//! terminal rather than re-spawning a fresh process per command.
//!
//! Command completion is detected with a sentinel marker: each `run` writes
//! the command followed by an `echo` of a unique uuid-based marker to both
//! stdout and stderr, then reads each stream until its marker reappears or
//! the timeout elapses.
//!
//! Timeout policy: kill-and-restart. A timed-out interpreter is killed (its
//! whole process group, so foreground children go with it) and the session
//! marks itself closed; the next `run` transparently starts a fresh
//! interpreter. Partial output captured before the timeout is returned.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::SessionError;
use crate::safety::SafetyGate;

/// Result of one command invocation against the session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

/// Host-platform shell variant. The session contract is identical across
/// both; only the interpreter binary and sentinel rendering differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    Posix,
    Windows,
}

impl ShellFlavor {
    /// The flavor matching the compile-time host platform.
    pub fn host_default() -> Self {
        if cfg!(windows) {
            ShellFlavor::Windows
        } else {
            ShellFlavor::Posix
        }
    }

    /// Whether this flavor can run on the current host.
    pub fn available_on_host(&self) -> bool {
        *self == Self::host_default()
    }

    /// The interpreter binary name.
    pub fn binary(&self) -> &'static str {
        match self {
            ShellFlavor::Posix => "bash",
            ShellFlavor::Windows => "powershell",
        }
    }

    fn launch_args(&self) -> &'static [&'static str] {
        match self {
            ShellFlavor::Posix => &["--noprofile", "--norc"],
            ShellFlavor::Windows => &["-NoProfile", "-NoLogo", "-NonInteractive", "-Command", "-"],
        }
    }

    /// Render a command plus sentinel echoes for this flavor.
    ///
    /// The stdout sentinel carries the command's exit code after a colon;
    /// the stderr sentinel is bare and only signals stream completion.
    fn render(&self, command: &str, mark: &str) -> String {
        match self {
            ShellFlavor::Posix => {
                format!("{command}\necho \"{mark}:$?\"\necho \"{mark}:\" 1>&2\n")
            }
            ShellFlavor::Windows => format!(
                "{command}\r\nWrite-Output \"{mark}:$LASTEXITCODE\"\r\n[Console]::Error.WriteLine(\"{mark}:\")\r\n"
            ),
        }
    }
}

/// Pipes of the live interpreter. Present exactly while the session is open.
struct SessionIo {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: BufReader<ChildStderr>,
}

/// A persistent shell session: at most one live subprocess, commands strictly
/// serialized (`run` takes `&mut self`; there is no internal queue).
pub struct ShellSession {
    flavor: ShellFlavor,
    gate: SafetyGate,
    io: Option<SessionIo>,
}

impl ShellSession {
    /// Create a session. The interpreter is not spawned until the first
    /// allowed command runs.
    pub fn new(flavor: ShellFlavor, gate: SafetyGate) -> Self {
        Self {
            flavor,
            gate,
            io: None,
        }
    }

    /// Whether a subprocess is currently live.
    pub fn is_open(&self) -> bool {
        self.io.is_some()
    }

    /// Acquire the interpreter subprocess. Idempotent: calling it twice
    /// reuses the existing session.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.io.is_some() {
            return Ok(());
        }

        let binary = self.flavor.binary();
        let mut cmd = Command::new(binary);
        cmd.args(self.flavor.launch_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Run the interpreter in its own process group so a timeout kill
        // takes foreground children (e.g. a hung `sleep`) with it.
        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
            });
        }

        let mut child = cmd.spawn().map_err(|e| SessionError::StartFailed {
            binary: binary.to_string(),
            message: e.to_string(),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| SessionError::StartFailed {
            binary: binary.to_string(),
            message: "failed to open stdin pipe".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| SessionError::StartFailed {
            binary: binary.to_string(),
            message: "failed to open stdout pipe".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| SessionError::StartFailed {
            binary: binary.to_string(),
            message: "failed to open stderr pipe".to_string(),
        })?;

        tracing::debug!(binary, "shell session started");
        self.io = Some(SessionIo {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr: BufReader::new(stderr),
        });
        Ok(())
    }

    /// Execute one command with a timeout.
    ///
    /// The command is vetted by the safety gate first; a rejected command is
    /// never written to the subprocess and comes back as a `CommandResult`
    /// with exit code 126 and the verdict JSON in stderr. On timeout the
    /// partial output captured so far is returned with `timed_out = true`
    /// and the interpreter is killed; the next `run` starts a fresh one.
    ///
    /// A command that terminates the interpreter itself (e.g. `exit 42`)
    /// never reaches the sentinel echo; the child is reaped and its own
    /// exit status is reported, and the next `run` starts a fresh
    /// interpreter.
    pub async fn run(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandResult, SessionError> {
        let verdict = self.gate.check(command);
        if !verdict.allowed {
            return Ok(CommandResult {
                stdout: String::new(),
                stderr: verdict.to_json(),
                exit_code: Some(126), // standard "cannot execute" code
                timed_out: false,
            });
        }

        self.start().await?;
        let io = self.io.as_mut().ok_or(SessionError::Closed)?;

        let mark = format!("__QUILL_DONE_{}__", Uuid::new_v4().simple());
        let script = self.flavor.render(command, &mark);
        io.stdin.write_all(script.as_bytes()).await?;
        io.stdin.flush().await?;

        let deadline = Instant::now() + timeout;
        let mut stdout_buf: Vec<u8> = Vec::new();
        let mut stderr_buf: Vec<u8> = Vec::new();

        // Drain both streams concurrently; each stops at its own sentinel.
        let SessionIo { stdout, stderr, .. } = io;
        let (out_res, err_res) = tokio::join!(
            tokio::time::timeout_at(deadline, drain_until_mark(stdout, &mut stdout_buf, &mark)),
            tokio::time::timeout_at(deadline, drain_until_mark(stderr, &mut stderr_buf, &mark)),
        );

        let timed_out = out_res.is_err() || err_res.is_err();
        let mut interpreter_gone = false;

        let mut exit_code = match out_res {
            Ok(Ok(Some(code_text))) => code_text.trim().parse::<i32>().ok(),
            Ok(Ok(None)) => {
                // EOF before the sentinel: the interpreter died.
                interpreter_gone = true;
                None
            }
            Ok(Err(e)) => {
                self.close().await;
                return Err(SessionError::Io(e));
            }
            Err(_) => None, // timeout
        };
        match err_res {
            Ok(Ok(Some(_))) | Err(_) => {}
            Ok(Ok(None)) => interpreter_gone = true,
            Ok(Err(e)) => {
                self.close().await;
                return Err(SessionError::Io(e));
            }
        }

        if timed_out {
            self.close().await;
        } else if interpreter_gone {
            // EOF before the sentinel: the command took the interpreter with
            // it. Reap the child and report its own exit status.
            if let Some(mut io) = self.io.take() {
                let _ = io.child.start_kill();
                if let Ok(status) = io.child.wait().await {
                    if exit_code.is_none() {
                        exit_code = status.code();
                    }
                }
                tracing::debug!("shell interpreter exited");
            }
        }

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
            exit_code,
            timed_out,
        })
    }

    /// Kill and reap the interpreter. Safe to call on a closed session.
    /// Also runs implicitly on drop via `kill_on_drop`, so the subprocess is
    /// released on all exit paths.
    pub async fn close(&mut self) {
        if let Some(mut io) = self.io.take() {
            #[cfg(unix)]
            if let Some(pid) = io.child.id() {
                kill_process_group(pid);
            }
            let _ = io.child.start_kill();
            let _ = io.child.wait().await;
            tracing::debug!("shell session closed");
        }
    }
}

/// SIGKILL an entire process group (the interpreter plus its children).
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
}

/// Read lines from `reader` into `buf` until a line containing `mark` arrives.
///
/// Returns `Some(text_after_mark)` when the sentinel is found (the exit-code
/// text on stdout, empty on stderr), or `None` on EOF. Output preceding the
/// sentinel on the same line (a final write without a trailing newline) is
/// preserved in `buf`.
async fn drain_until_mark<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    mark: &str,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mark_bytes = mark.as_bytes();
    loop {
        let mut chunk = Vec::new();
        let n = reader.read_until(b'\n', &mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        if let Some(pos) = find_subslice(&chunk, mark_bytes) {
            buf.extend_from_slice(&chunk[..pos]);
            let after = &chunk[pos + mark_bytes.len()..];
            let code = String::from_utf8_lossy(after)
                .trim_start_matches(':')
                .trim()
                .to_string();
            return Ok(Some(code));
        }
        buf.extend_from_slice(&chunk);
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_subslice_locates_needle() {
        assert_eq!(find_subslice(b"hello __MARK__ world", b"__MARK__"), Some(6));
        assert_eq!(find_subslice(b"no marker here", b"__MARK__"), None);
        assert_eq!(find_subslice(b"", b"__MARK__"), None);
    }

    #[test]
    fn posix_render_includes_command_and_sentinels() {
        let script = ShellFlavor::Posix.render("echo hi", "__M__");
        assert!(script.starts_with("echo hi\n"));
        assert!(script.contains("echo \"__M__:$?\""));
        assert!(script.contains("1>&2"));
    }

    #[test]
    fn windows_render_uses_lastexitcode() {
        let script = ShellFlavor::Windows.render("Get-Location", "__M__");
        assert!(script.contains("$LASTEXITCODE"));
        assert!(script.contains("[Console]::Error.WriteLine"));
    }

    #[test]
    fn host_default_is_available() {
        assert!(ShellFlavor::host_default().available_on_host());
    }
}
