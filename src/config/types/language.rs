//! Language profile configuration
//!
//! Extra (or overriding) language profiles declared in the config file.

use serde::{Deserialize, Serialize};

/// A language profile as written in configuration
///
/// Command entries may contain `{file}`, which is replaced by the path of
/// the staged source file inside the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Container image holding the toolchain
    pub image: String,
    /// Command used for batch execution
    pub command: Vec<String>,
    /// Command used for interactive sessions (defaults to `command`)
    #[serde(default)]
    pub interactive_command: Option<Vec<String>>,
    /// Source file extension, with or without the leading dot
    pub extension: String,
    /// Alternative identifiers accepted for this language
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_config_from_toml() {
        let config: LanguageConfig = toml::from_str(
            r#"
            image = "ruby:3.3-slim"
            command = ["ruby", "{file}"]
            extension = ".rb"
            aliases = ["rb"]
            "#,
        )
        .unwrap();

        assert_eq!(config.image, "ruby:3.3-slim");
        assert_eq!(config.command, vec!["ruby", "{file}"]);
        assert!(config.interactive_command.is_none());
        assert_eq!(config.aliases, vec!["rb"]);
    }
}
