pub mod command_filter;
pub mod defaults;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use command_filter::{CommandFilter, Verdict};

/// Pre-execution gate for shell commands: checks each candidate against the
/// ban list and records rejections to a security log.
///
/// This is the single entry point for command vetting. The shell session
/// calls [`SafetyGate::check`] before writing anything to its subprocess.
pub struct SafetyGate {
    filter: CommandFilter,
    security_log_path: PathBuf,
}

impl SafetyGate {
    /// Build a gate from (pattern, reason) tuples and a security log path.
    pub fn new(
        patterns: &[(String, String)],
        security_log_path: PathBuf,
    ) -> anyhow::Result<Self> {
        let filter = CommandFilter::new(patterns)
            .map_err(|e| anyhow::anyhow!("Failed to compile ban list patterns: {}", e))?;
        Ok(Self {
            filter,
            security_log_path,
        })
    }

    /// Check a command. Rejections are appended to the security log before
    /// the verdict is returned.
    pub fn check(&self, command: &str) -> Verdict {
        let verdict = self.filter.is_allowed(command);
        if !verdict.allowed {
            self.log_rejection(&verdict);
        }
        verdict
    }

    /// Append a JSON line to the security log for a rejected command.
    ///
    /// If the log file cannot be written, a warning is logged via tracing but
    /// the verdict is unaffected.
    fn log_rejection(&self, verdict: &Verdict) {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let log_entry = format!(
            "{{\"timestamp\":{},\"allowed\":false,\"reason\":{},\"command\":{}}}\n",
            timestamp,
            serde_json::to_string(&verdict.reason).unwrap_or_else(|_| "\"unknown\"".into()),
            serde_json::to_string(&verdict.command).unwrap_or_else(|_| "\"unknown\"".into()),
        );

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.security_log_path)
        {
            Ok(mut file) => {
                if let Err(e) = file.write_all(log_entry.as_bytes()) {
                    tracing::warn!(
                        "Failed to write to security log at {}: {}",
                        self.security_log_path.display(),
                        e
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to open security log at {}: {}",
                    self.security_log_path.display(),
                    e
                );
            }
        }
    }
}
