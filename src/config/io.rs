//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use super::types::Config;
use crate::error::{Error, Result};

/// A snapshot of the configuration file
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Path to the config file
    pub path: std::path::PathBuf,
    /// Whether the file exists
    pub exists: bool,
    /// Raw file content
    pub raw: Option<String>,
    /// Parsed configuration
    pub config: Option<Config>,
    /// Read/parse issues
    pub issues: Vec<String>,
}

/// Load configuration with layered precedence:
/// 1. Config file (config.json or config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<Config> {
    // Detect format by extension
    let config: Config = if path.extension().map_or(false, |ext| ext == "json") {
        json5::from_str(content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().map_or(false, |ext| ext == "toml") {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(content)
            .or_else(|_| toml::from_str(content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads a `.env` file if present, then overlays any set variables.
/// Env vars have the highest precedence: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();

    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`; unparsable values are ignored
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Server overrides
    if let Some(port) = lookup("CODERUNNER_PORT").or_else(|| lookup("PORT")) {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!("Ignoring invalid port override: {}", port),
        }
    }
    if let Some(bind) = lookup("CODERUNNER_BIND") {
        config.server.bind = bind;
    }

    // Sandbox overrides
    if let Some(secs) = lookup("CODERUNNER_TIMEOUT_SECS") {
        if let Ok(secs) = secs.parse() {
            config.sandbox.timeout = std::time::Duration::from_secs(secs);
        }
    }
    if let Some(limit) = lookup("CODERUNNER_MEMORY_LIMIT") {
        config.sandbox.memory_limit = limit;
    }
    if let Some(shares) = lookup("CODERUNNER_CPU_SHARES") {
        if let Ok(shares) = shares.parse() {
            config.sandbox.cpu_shares = shares;
        }
    }
    if let Some(v) = lookup("CODERUNNER_PULL_IMAGES") {
        config.sandbox.pull_missing_images = v == "true" || v == "1";
    }
    if let Some(root) = lookup("CODERUNNER_WORKSPACE_ROOT") {
        config.sandbox.workspace_root = Some(std::path::PathBuf::from(root));
    }
    if let Some(mode) = lookup("CODERUNNER_PATH_TRANSLATION") {
        if let Ok(mode) = mode.parse() {
            config.sandbox.path_translation = mode;
        }
    }
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().map_or(false, |ext| ext == "toml") {
        toml::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}

/// Read a configuration file into a snapshot
pub fn read_config_snapshot(path: &Path) -> ConfigSnapshot {
    if !path.exists() {
        return ConfigSnapshot {
            path: path.to_path_buf(),
            exists: false,
            raw: None,
            config: None,
            issues: vec!["Configuration file does not exist".to_string()],
        };
    }

    let raw = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return ConfigSnapshot {
                path: path.to_path_buf(),
                exists: true,
                raw: None,
                config: None,
                issues: vec![format!("Failed to read file: {}", e)],
            };
        }
    };

    match parse_config(path, &raw) {
        Ok(config) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            raw: Some(raw),
            config: Some(config),
            issues: Vec::new(),
        },
        Err(e) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            raw: Some(raw),
            config: None,
            issues: vec![format!("Failed to parse config: {}", e)],
        },
    }
}
