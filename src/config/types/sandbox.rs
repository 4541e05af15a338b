//! Sandbox configuration types
//!
//! Resource limits, timeouts and workspace placement for container execution.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Wall-clock limit for a batch execution
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    /// Memory ceiling (e.g. "256m", "1g")
    #[serde(default = "default_memory")]
    pub memory_limit: String,
    /// Relative CPU weight
    #[serde(default = "default_cpu_shares")]
    pub cpu_shares: i64,
    /// Network mode; "none" disables networking
    #[serde(default = "default_network")]
    pub network: String,
    /// Grace period given to a sandbox before it is killed on stop
    #[serde(with = "humantime_serde", default = "default_stop_grace")]
    pub stop_grace_period: Duration,
    /// Upper bound on reading trailing output once the sandbox has ended
    #[serde(with = "humantime_serde", default = "default_drain_timeout")]
    pub drain_timeout: Duration,
    /// Pull the language image before creating a sandbox if it is missing
    #[serde(default)]
    pub pull_missing_images: bool,
    /// Parent directory for workspaces (defaults to the OS temp dir)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
    /// How host workspace paths map to paths inside the sandbox
    #[serde(default)]
    pub path_translation: PathTranslation,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            timeout: default_timeout(),
            memory_limit: default_memory(),
            cpu_shares: default_cpu_shares(),
            network: default_network(),
            stop_grace_period: default_stop_grace(),
            drain_timeout: default_drain_timeout(),
            pull_missing_images: false,
            workspace_root: None,
            path_translation: PathTranslation::default(),
        }
    }
}

impl SandboxConfig {
    /// Memory ceiling in bytes, if `memory_limit` parses
    pub fn memory_bytes(&self) -> Option<i64> {
        parse_memory_limit(&self.memory_limit)
    }

    /// Whether the sandbox gets no network access
    pub fn network_disabled(&self) -> bool {
        self.network == "none"
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_memory() -> String {
    "256m".to_string()
}

fn default_cpu_shares() -> i64 {
    512
}

fn default_network() -> String {
    "none".to_string()
}

fn default_stop_grace() -> Duration {
    Duration::from_secs(2)
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Host-to-sandbox path mapping for the workspace bind mount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathTranslation {
    /// Pick `Windows` on Windows hosts, `Identity` elsewhere
    #[default]
    Auto,
    /// Mount at the same path as on the host
    Identity,
    /// `C:\Users\me\x` becomes `/c/users/me/x`
    Windows,
}

impl std::str::FromStr for PathTranslation {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(PathTranslation::Auto),
            "identity" | "none" => Ok(PathTranslation::Identity),
            "windows" | "win32" => Ok(PathTranslation::Windows),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid path translation: {}. Valid: auto, identity, windows",
                s
            ))),
        }
    }
}

/// Parse a memory limit string (e.g., "512m", "1g") to bytes
pub fn parse_memory_limit(limit: &str) -> Option<i64> {
    let limit = limit.trim().to_lowercase();
    let (num_str, unit) = if limit.ends_with("g") || limit.ends_with("gb") {
        (limit.trim_end_matches(|c| c == 'g' || c == 'b'), "g")
    } else if limit.ends_with("m") || limit.ends_with("mb") {
        (limit.trim_end_matches(|c| c == 'm' || c == 'b'), "m")
    } else if limit.ends_with("k") || limit.ends_with("kb") {
        (limit.trim_end_matches(|c| c == 'k' || c == 'b'), "k")
    } else {
        (limit.as_str(), "b")
    };

    let num: i64 = num_str.parse().ok()?;

    Some(match unit {
        "g" => num * 1024 * 1024 * 1024,
        "m" => num * 1024 * 1024,
        "k" => num * 1024,
        _ => num,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(parse_memory_limit("256m"), Some(256 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1g"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1024kb"), Some(1024 * 1024));
        assert_eq!(parse_memory_limit("1024"), Some(1024));
        assert_eq!(parse_memory_limit("lots"), None);
    }

    #[test]
    fn test_sandbox_config_default() {
        let config = SandboxConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.memory_bytes(), Some(256 * 1024 * 1024));
        assert_eq!(config.cpu_shares, 512);
        assert!(config.network_disabled());
        assert!(!config.pull_missing_images);
    }

    #[test]
    fn test_path_translation_parsing() {
        assert_eq!(
            "identity".parse::<PathTranslation>().unwrap(),
            PathTranslation::Identity
        );
        assert_eq!(
            "WIN32".parse::<PathTranslation>().unwrap(),
            PathTranslation::Windows
        );
        assert!("posix".parse::<PathTranslation>().is_err());
    }

    #[test]
    fn test_humantime_durations() {
        let config: SandboxConfig =
            serde_json::from_str(r#"{"timeout": "30s", "drain_timeout": "500ms"}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.drain_timeout, Duration::from_millis(500));
        assert_eq!(config.stop_grace_period, Duration::from_secs(2));
    }
}
