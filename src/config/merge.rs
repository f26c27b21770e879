use super::schema::{AppConfig, PartialConfig};
use crate::safety::defaults::default_banlist;
use std::path::PathBuf;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    /// For banned_patterns: REPLACE semantics (if self has Some, use it entirely).
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            model: self.model.or(fallback.model),
            workdir: self.workdir.or(fallback.workdir),
            shell_timeout_secs: self.shell_timeout_secs.or(fallback.shell_timeout_secs),
            max_turns: self.max_turns.or(fallback.max_turns),
            banned_patterns: self.banned_patterns.or(fallback.banned_patterns),
            security_log_path: self.security_log_path.or(fallback.security_log_path),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    pub fn finalize(self) -> AppConfig {
        let workdir = self
            .workdir
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let security_log_path = self
            .security_log_path
            .unwrap_or_else(|| workdir.join(".quill").join("security.log"));

        AppConfig {
            model: self.model.unwrap_or_else(|| "deepseek-chat".to_string()),
            workdir,
            shell_timeout_secs: self.shell_timeout_secs.unwrap_or(30),
            max_turns: self.max_turns.unwrap_or(50),
            banned_patterns: self.banned_patterns.unwrap_or_else(default_banlist),
            security_log_path,
        }
    }
}
