use serde::Deserialize;
use std::path::PathBuf;

/// The TOML file structure for quill.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub safety: Option<SafetyConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub max_turns: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SafetyConfig {
    pub shell_timeout_secs: Option<u64>,
    /// If specified, fully replaces the default ban list.
    pub banned_patterns: Option<Vec<BanlistEntry>>,
    pub security_log: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BanlistEntry {
    pub pattern: String,
    pub reason: String,
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub workdir: PathBuf,
    pub shell_timeout_secs: u64,
    pub max_turns: u64,
    pub banned_patterns: Vec<(String, String)>,
    pub security_log_path: PathBuf,
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub model: Option<String>,
    pub workdir: Option<PathBuf>,
    pub shell_timeout_secs: Option<u64>,
    pub max_turns: Option<u64>,
    pub banned_patterns: Option<Vec<(String, String)>>,
    pub security_log_path: Option<PathBuf>,
}

impl ConfigFile {
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            model: self.general.as_ref().and_then(|g| g.model.clone()),
            workdir: None,
            shell_timeout_secs: self
                .safety
                .as_ref()
                .and_then(|s| s.shell_timeout_secs),
            max_turns: self.general.as_ref().and_then(|g| g.max_turns),
            banned_patterns: self.safety.as_ref().and_then(|s| {
                s.banned_patterns.as_ref().map(|entries| {
                    entries
                        .iter()
                        .map(|e| (e.pattern.clone(), e.reason.clone()))
                        .collect()
                })
            }),
            security_log_path: self
                .safety
                .as_ref()
                .and_then(|s| s.security_log.as_ref().map(PathBuf::from)),
        }
    }
}
