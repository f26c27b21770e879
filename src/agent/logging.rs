//! JSONL session logger for full session replay.
//!
//! Writes structured events to timestamped JSONL files under
//! `{workdir}/.quill/logs/`. Each run produces a file named
//! `session-{ISO8601}.jsonl`.
//!
//! Uses synchronous `std::fs` since writes are small, buffered, and flushed
//! after each event -- no async complexity needed for append-only logging.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

/// Returns the current UTC time as an ISO 8601 string with milliseconds.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A structured log entry serialized as a single JSON line.
///
/// Tagged with `event_type` so each line is self-describing for replay.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type")]
pub enum LogEntry {
    /// Marks the beginning of an agent run.
    #[serde(rename = "session_start")]
    SessionStart {
        timestamp: String,
        model: String,
        workdir: String,
    },

    /// The user's natural-language request.
    #[serde(rename = "user_query")]
    UserQuery { timestamp: String, query: String },

    /// An assistant text response (thinking out loud or final answer).
    #[serde(rename = "assistant_text")]
    AssistantText {
        timestamp: String,
        turn: u64,
        content: String,
    },

    /// A tool call requested by the model.
    #[serde(rename = "tool_call")]
    ToolCall {
        timestamp: String,
        turn: u64,
        call_id: String,
        fn_name: String,
        fn_arguments: serde_json::Value,
    },

    /// The result of a tool call execution.
    #[serde(rename = "tool_result")]
    ToolResult {
        timestamp: String,
        turn: u64,
        call_id: String,
        fn_name: String,
        result: String,
    },

    /// An error encountered during the run.
    #[serde(rename = "error")]
    Error {
        timestamp: String,
        turn: u64,
        message: String,
    },

    /// Marks the end of an agent run.
    #[serde(rename = "session_end")]
    SessionEnd {
        timestamp: String,
        total_turns: u64,
        reason: String,
    },
}

/// Append-only JSONL logger for agent runs.
///
/// Creates a timestamped log file in `{workdir}/.quill/logs/` and writes one
/// JSON object per line. Flushes after each event for durability.
pub struct SessionLogger {
    writer: BufWriter<fs::File>,
    log_path: PathBuf,
}

impl SessionLogger {
    /// Create a new session logger under the given working directory.
    pub fn new(workdir: &Path) -> anyhow::Result<Self> {
        let log_dir = workdir.join(".quill").join("logs");
        fs::create_dir_all(&log_dir)?;

        let session_id = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let log_path = log_dir.join(format!("session-{session_id}.jsonl"));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            writer: BufWriter::new(file),
            log_path,
        })
    }

    /// Serialize a log entry as a single JSON line and flush.
    pub fn log_event(&mut self, event: &LogEntry) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Return the path to the current session log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Convenience: log a session_start event.
    pub fn log_session_start(&mut self, model: &str, workdir: &Path) -> anyhow::Result<()> {
        self.log_event(&LogEntry::SessionStart {
            timestamp: now_iso(),
            model: model.to_string(),
            workdir: workdir.display().to_string(),
        })
    }

    /// Convenience: log a session_end event.
    pub fn log_session_end(&mut self, total_turns: u64, reason: &str) -> anyhow::Result<()> {
        self.log_event(&LogEntry::SessionEnd {
            timestamp: now_iso(),
            total_turns,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use tempfile::TempDir;

    fn make_logger() -> (SessionLogger, TempDir) {
        let tmp = TempDir::new().expect("tempdir");
        let logger = SessionLogger::new(tmp.path()).expect("SessionLogger::new");
        (logger, tmp)
    }

    #[test]
    fn creates_log_file_under_quill_logs() {
        let (logger, tmp) = make_logger();
        let log_dir = tmp.path().join(".quill").join("logs");
        assert!(log_dir.is_dir());
        assert!(logger.log_path().starts_with(&log_dir));
        assert!(logger.log_path().exists());
    }

    #[test]
    fn events_are_one_json_object_per_line() {
        let (mut logger, _tmp) = make_logger();
        logger.log_session_start("test-model", Path::new("/tmp/x")).unwrap();
        logger
            .log_event(&LogEntry::UserQuery {
                timestamp: now_iso(),
                query: "list the files".to_string(),
            })
            .unwrap();
        logger.log_session_end(3, "answered").unwrap();

        let file = fs::File::open(logger.log_path()).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(parsed["event_type"].is_string());
        }
        let last: serde_json::Value = serde_json::from_str(&lines[2]).unwrap();
        assert_eq!(last["event_type"], "session_end");
        assert_eq!(last["total_turns"], 3);
    }
}
