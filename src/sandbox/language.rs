//! Language registry
//!
//! Maps a language identifier to the image, command and file extension used
//! to run it. The registry is built once at startup and shared read-only.

use serde::Serialize;
use std::collections::HashMap;

use crate::config::LanguageConfig;
use crate::error::{Error, Result};

/// Placeholder replaced by the in-sandbox source path
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Everything needed to run one language inside a sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageProfile {
    /// Canonical language name
    pub name: String,
    /// Container image holding the toolchain
    pub image: String,
    /// Batch command template
    #[serde(skip)]
    pub command: Vec<String>,
    /// Interactive command template
    #[serde(skip)]
    pub interactive_command: Vec<String>,
    /// Source file extension, including the leading dot
    pub extension: String,
    /// Alternative identifiers
    pub aliases: Vec<String>,
}

impl LanguageProfile {
    fn builtin(
        name: &str,
        image: &str,
        command: &[&str],
        interactive_command: &[&str],
        extension: &str,
        aliases: &[&str],
    ) -> Self {
        LanguageProfile {
            name: name.to_string(),
            image: image.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            interactive_command: interactive_command.iter().map(|s| s.to_string()).collect(),
            extension: extension.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build a profile from its configured form
    pub fn from_config(name: &str, config: &LanguageConfig) -> Self {
        let extension = config.extension.trim_start_matches('.');
        LanguageProfile {
            name: name.to_lowercase(),
            image: config.image.clone(),
            command: config.command.clone(),
            interactive_command: config
                .interactive_command
                .clone()
                .unwrap_or_else(|| config.command.clone()),
            extension: format!(".{}", extension),
            aliases: config.aliases.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    /// Name of the staged source file
    pub fn source_file_name(&self) -> String {
        format!("code{}", self.extension)
    }

    /// Argv for a batch run of the source at `file`
    pub fn batch_argv(&self, file: &str) -> Vec<String> {
        render(&self.command, file)
    }

    /// Argv for an interactive run of the source at `file`
    pub fn interactive_argv(&self, file: &str) -> Vec<String> {
        render(&self.interactive_command, file)
    }
}

fn render(template: &[String], file: &str) -> Vec<String> {
    template
        .iter()
        .map(|arg| arg.replace(FILE_PLACEHOLDER, file))
        .collect()
}

/// Built-in profiles
pub fn builtin_profiles() -> Vec<LanguageProfile> {
    vec![
        LanguageProfile::builtin(
            "python",
            "python:3.9-slim",
            &["python", "{file}"],
            // -u keeps output unbuffered so prompts show up before input is read
            &["/bin/bash", "-c", "stty echo && python -u {file}"],
            ".py",
            &["py", "python3"],
        ),
        LanguageProfile::builtin(
            "c",
            "gcc",
            &["sh", "-c", "gcc {file} -o /tmp/out && /tmp/out"],
            &["/bin/bash", "-c", "stty echo && gcc {file} -o /tmp/out && /tmp/out"],
            ".c",
            &[],
        ),
        LanguageProfile::builtin(
            "java",
            "openjdk",
            &["java", "{file}"],
            &["/bin/bash", "-c", "stty echo && java {file}"],
            ".java",
            &[],
        ),
    ]
}

/// Immutable language lookup table
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    profiles: Vec<LanguageProfile>,
    index: HashMap<String, usize>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(builtin_profiles())
    }
}

impl LanguageRegistry {
    /// Build a registry; later profiles replace earlier ones with the same name
    pub fn new(profiles: impl IntoIterator<Item = LanguageProfile>) -> Self {
        let mut ordered: Vec<LanguageProfile> = Vec::new();
        for profile in profiles {
            match ordered.iter_mut().find(|p| p.name == profile.name) {
                Some(existing) => *existing = profile,
                None => ordered.push(profile),
            }
        }

        let mut index = HashMap::new();
        // Aliases first so a canonical name always wins over another profile's alias
        for (i, profile) in ordered.iter().enumerate() {
            for alias in &profile.aliases {
                index.insert(alias.clone(), i);
            }
        }
        for (i, profile) in ordered.iter().enumerate() {
            index.insert(profile.name.clone(), i);
        }

        LanguageRegistry {
            profiles: ordered,
            index,
        }
    }

    /// Built-in profiles overlaid with configured ones
    pub fn with_overrides<'a, I>(configured: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a LanguageConfig)>,
    {
        let extra = configured
            .into_iter()
            .map(|(name, config)| LanguageProfile::from_config(name, config));
        Self::new(builtin_profiles().into_iter().chain(extra))
    }

    /// Look up a language by name or alias
    pub fn resolve(&self, language: &str) -> Result<&LanguageProfile> {
        self.index
            .get(&language.trim().to_lowercase())
            .map(|&i| &self.profiles[i])
            .ok_or_else(|| Error::UnsupportedLanguage(language.to_string()))
    }

    /// Whether `language` resolves to a profile
    pub fn supports(&self, language: &str) -> bool {
        self.resolve(language).is_ok()
    }

    /// All registered profiles, in registration order
    pub fn languages(&self) -> &[LanguageProfile] {
        &self.profiles
    }
}
