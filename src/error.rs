use std::path::PathBuf;

/// Errors related to configuration loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {name}")]
    MissingCredential { name: String },
}

/// Errors produced by file tools.
///
/// These are always rendered into the tool's string result so the model can
/// observe them and retry with adjusted arguments. They never abort the run.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(
        "Found {count} occurrences of old_string in {path}; it must match exactly once. \
         Include more surrounding context to disambiguate."
    )]
    AmbiguousMatch { path: PathBuf, count: usize },

    #[error("old_string not found in {0}")]
    NoMatch(PathBuf),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Missing or invalid '{0}' argument")]
    BadArgument(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the persistent shell session.
///
/// `StartFailed` is fatal to the run -- a missing interpreter binary will not
/// appear by retrying. Rejected commands and timeouts are NOT errors; they are
/// reported through [`crate::exec::CommandResult`] so the session stays usable
/// for the next command.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to start shell interpreter '{binary}': {message}")]
    StartFailed { binary: String, message: String },

    #[error("Shell session is closed")]
    Closed,

    #[error("I/O error on shell session: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the agent dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Maximum turn count ({0}) reached without a final answer")]
    MaxTurns(u64),
}
