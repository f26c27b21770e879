pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::Cli;
use crate::error::ConfigError;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Environment variable holding the chat API credential.
pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

/// Load configuration by merging global, project, and CLI sources.
/// Precedence: CLI > project config > global config > defaults.
///
/// Missing config files are handled gracefully (defaults apply).
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    // Layer 1: Global config (~/.config/quill/quill.toml or platform
    // equivalent). An explicitly passed --config path must exist and parse;
    // only the implicit search degrades to defaults.
    let global = match &cli.config {
        Some(path) => load_required_toml_file(path)?,
        None => load_global_config(),
    };

    // Determine the working directory for loading the project config.
    let workdir = match &cli.cwd {
        Some(dir) => {
            let canonical = std::fs::canonicalize(dir)
                .with_context(|| format!("Cannot use working directory '{}'", dir.display()))?;
            if !canonical.is_dir() {
                anyhow::bail!("'{}' is not a directory", dir.display());
            }
            canonical
        }
        None => std::env::current_dir()?,
    };

    // Layer 2: Project config (<workdir>/quill.toml)
    let project = load_project_config(&workdir);

    // Layer 3: CLI args (converted to PartialConfig)
    let cli_partial = PartialConfig {
        model: cli.model.clone(),
        workdir: Some(workdir),
        shell_timeout_secs: cli.timeout,
        ..Default::default()
    };

    // Merge: CLI > project > global > defaults
    Ok(cli_partial
        .with_fallback(project)
        .with_fallback(global)
        .finalize())
}

/// Verify the required API credential is present before doing anything else.
/// A missing key is an unrecoverable startup failure.
pub fn require_api_key() -> Result<(), ConfigError> {
    match std::env::var(API_KEY_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingCredential {
            name: API_KEY_VAR.to_string(),
        }),
    }
}

/// Load a config file the user named explicitly. Unlike the search paths,
/// a missing or malformed file here is a startup failure.
fn load_required_toml_file(path: &Path) -> anyhow::Result<PartialConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
    let config_file: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("Cannot parse config file '{}'", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config_file.to_partial())
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_toml_file(&p).unwrap_or_default(),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load project config from <workdir>/quill.toml.
/// Returns empty PartialConfig if file not found.
fn load_project_config(workdir: &Path) -> PartialConfig {
    let config_path = workdir.join("quill.toml");
    load_toml_file(&config_path).unwrap_or_default()
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns None on file-not-found; logs and skips on parse errors.
fn load_toml_file(path: &Path) -> Option<PartialConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            match toml::from_str::<ConfigFile>(&contents)
                .context(format!("Failed to parse {}", path.display()))
            {
                Ok(config_file) => {
                    tracing::info!("Loaded config from {}", path.display());
                    Some(config_file.to_partial())
                }
                Err(e) => {
                    tracing::warn!("Config parse error: {:#}", e);
                    None
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to read config at {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/quill/quill.toml
/// macOS: ~/Library/Application Support/quill/quill.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "quill")
        .map(|dirs| dirs.config_dir().join("quill.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_config(path: PathBuf) -> Cli {
        Cli {
            query: vec![],
            interactive: false,
            cwd: None,
            model: None,
            timeout: None,
            config: Some(path),
        }
    }

    #[test]
    fn explicit_missing_config_is_a_startup_error() {
        let tmp = TempDir::new().unwrap();
        let cli = cli_with_config(tmp.path().join("nope.toml"));
        let err = load_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Cannot read config file"));
    }

    #[test]
    fn explicit_malformed_config_is_a_startup_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "general = [not toml").unwrap();
        let cli = cli_with_config(path);
        let err = load_config(&cli).unwrap_err();
        assert!(err.to_string().contains("Cannot parse config file"));
    }

    #[test]
    fn explicit_valid_config_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("quill.toml");
        std::fs::write(&path, "[general]\nmax_turns = 7\n").unwrap();
        let cli = cli_with_config(path);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.max_turns, 7);
    }
}
