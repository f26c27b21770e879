//! Integration tests for the persistent shell session.
//!
//! These exercise a real interpreter, so they are unix-only.
#![cfg(unix)]

use std::time::{Duration, Instant};

use tempfile::TempDir;

use quill::exec::{ShellFlavor, ShellSession};
use quill::safety::defaults::default_banlist;
use quill::safety::SafetyGate;

fn make_session(tmp: &TempDir) -> ShellSession {
    let gate = SafetyGate::new(&default_banlist(), tmp.path().join("security.log")).unwrap();
    ShellSession::new(ShellFlavor::Posix, gate)
}

// ============================================================
// Normal execution
// ============================================================

#[tokio::test]
async fn test_stdout_capture_and_exit_code() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);
    let result = session.run("echo hello", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout, "hello\n");
    assert_eq!(result.exit_code, Some(0));
    assert!(!result.timed_out);
    session.close().await;
}

#[tokio::test]
async fn test_stderr_capture() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);
    let result = session.run("echo err 1>&2", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stderr, "err\n");
    assert_eq!(result.stdout, "");
    assert_eq!(result.exit_code, Some(0));
    session.close().await;
}

#[tokio::test]
async fn test_nonzero_exit_code() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);
    let result = session.run("exit 42", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.exit_code, Some(42));
    assert!(!result.timed_out);
    session.close().await;
}

#[tokio::test]
async fn test_interpreter_exit_reports_status_and_session_restarts() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    // `exit` terminates the interpreter before the sentinel echo runs; the
    // child's own exit status is reported instead.
    let result = session.run("echo last && exit 7", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout, "last\n");
    assert_eq!(result.exit_code, Some(7));
    assert!(!result.timed_out);
    assert!(!session.is_open());

    // Fresh interpreter on the next command.
    let result = session.run("echo back", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout.trim(), "back");
    assert_eq!(result.exit_code, Some(0));
    session.close().await;
}

#[tokio::test]
async fn test_output_without_trailing_newline() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);
    let result = session
        .run("printf 'no newline'", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result.stdout, "no newline");
    assert_eq!(result.exit_code, Some(0));
    session.close().await;
}

// ============================================================
// Session persistence
// ============================================================

#[tokio::test]
async fn test_working_directory_persists_across_commands() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    let first = session
        .run("cd /tmp && pwd", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(first.stdout.trim(), "/tmp");

    let second = session.run("pwd", Duration::from_secs(5)).await.unwrap();
    assert_eq!(second.stdout.trim(), "/tmp");
    session.close().await;
}

#[tokio::test]
async fn test_exported_variables_persist_across_commands() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    session
        .run("export QUILL_TEST_VAR=abc123", Duration::from_secs(5))
        .await
        .unwrap();
    let result = session
        .run("echo $QUILL_TEST_VAR", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result.stdout.trim(), "abc123");
    session.close().await;
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    session.start().await.unwrap();
    session.run("export KEEP=1", Duration::from_secs(5)).await.unwrap();
    // A second start must reuse the live interpreter, not replace it.
    session.start().await.unwrap();
    let result = session.run("echo $KEEP", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout.trim(), "1");
    session.close().await;
}

// ============================================================
// Safety integration
// ============================================================

#[tokio::test]
async fn test_rejected_command_never_reaches_the_subprocess() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    let result = session.run("sudo rm -rf /", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.exit_code, Some(126));
    assert!(!result.timed_out);
    assert!(result.stdout.is_empty());

    let verdict: serde_json::Value = serde_json::from_str(&result.stderr).unwrap();
    assert_eq!(verdict["allowed"], false);
    assert!(verdict["reason"].is_string());

    // The session is still lazy: the rejection happened before any spawn.
    assert!(!session.is_open());

    // Rejection was appended to the security log.
    let log = std::fs::read_to_string(tmp.path().join("security.log")).unwrap();
    assert!(log.contains("sudo rm -rf /"));
}

#[tokio::test]
async fn test_session_usable_after_rejection() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    session.run("reboot", Duration::from_secs(5)).await.unwrap();
    let result = session.run("echo ok", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout.trim(), "ok");
    session.close().await;
}

// ============================================================
// Timeout behavior (kill-and-restart policy)
// ============================================================

#[tokio::test]
async fn test_timeout_returns_partial_output_promptly() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    let start = Instant::now();
    let result = session
        .run("echo partial && sleep 60", Duration::from_secs(1))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert!(result.timed_out, "should report timed_out");
    assert_eq!(result.exit_code, None);
    assert_eq!(result.stdout, "partial\n");
    assert!(
        elapsed < Duration::from_secs(5),
        "timeout should fire within ~1 second, took {elapsed:?}"
    );
    // Kill-and-restart: the timed-out interpreter was killed.
    assert!(!session.is_open());
}

#[tokio::test]
async fn test_session_restarts_cleanly_after_timeout() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    session.run("sleep 60", Duration::from_secs(1)).await.unwrap();
    // Fresh interpreter on the next command.
    let result = session.run("echo ok", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout.trim(), "ok");
    assert_eq!(result.exit_code, Some(0));
    assert!(!result.timed_out);
    session.close().await;
}

// ============================================================
// Lifecycle
// ============================================================

#[tokio::test]
async fn test_close_is_idempotent_and_session_restarts() {
    let tmp = TempDir::new().unwrap();
    let mut session = make_session(&tmp);

    session.run("echo one", Duration::from_secs(5)).await.unwrap();
    assert!(session.is_open());
    session.close().await;
    assert!(!session.is_open());
    session.close().await; // no-op

    let result = session.run("echo two", Duration::from_secs(5)).await.unwrap();
    assert_eq!(result.stdout.trim(), "two");
    session.close().await;
}

#[tokio::test]
async fn test_missing_interpreter_is_start_failure() {
    // The Windows flavor wants powershell, which a unix host does not have.
    let tmp = TempDir::new().unwrap();
    let gate = SafetyGate::new(&default_banlist(), tmp.path().join("security.log")).unwrap();
    let mut session = ShellSession::new(ShellFlavor::Windows, gate);

    let result = session.run("echo hi", Duration::from_secs(5)).await;
    match result {
        Err(quill::error::SessionError::StartFailed { binary, .. }) => {
            assert_eq!(binary, "powershell");
        }
        other => panic!("expected StartFailed, got {other:?}"),
    }
    assert!(!session.is_open());
}
