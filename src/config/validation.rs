//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::sandbox::parse_memory_limit;
use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_sandbox_config(config, result);
    result = validate_language_config(config, result);

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let sandbox = &config.sandbox;

    if sandbox.timeout.is_zero() {
        result = result.with_error(
            ValidationIssue::new("sandbox.timeout", "Timeout must be greater than zero")
                .with_suggestion("Use a duration such as \"15s\""),
        );
    }

    if parse_memory_limit(&sandbox.memory_limit).map_or(true, |bytes| bytes <= 0) {
        result = result.with_error(
            ValidationIssue::new(
                "sandbox.memory_limit",
                format!("Invalid memory limit: {}", sandbox.memory_limit),
            )
            .with_suggestion("Use a size such as \"256m\" or \"1g\""),
        );
    }

    // The runtime rejects weights below 2
    if sandbox.cpu_shares < 2 {
        result = result.with_warning(
            ValidationIssue::new(
                "sandbox.cpu_shares",
                format!("CPU shares {} is below the runtime minimum of 2", sandbox.cpu_shares),
            )
            .with_suggestion("Use 512 for a half-weight sandbox"),
        );
    }

    if !sandbox.network_disabled() {
        result = result.with_warning(
            ValidationIssue::new(
                "sandbox.network",
                format!("Sandboxes will have network access (mode: {})", sandbox.network),
            )
            .with_suggestion("Set sandbox.network to \"none\" for untrusted code"),
        );
    }

    if let Some(root) = &sandbox.workspace_root {
        if !root.is_dir() {
            result = result.with_warning(
                ValidationIssue::new(
                    "sandbox.workspace_root",
                    format!("Workspace root does not exist: {}", root.display()),
                )
                .with_suggestion("Create the directory or remove sandbox.workspace_root"),
            );
        }
    }

    result
}

fn validate_language_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    for (name, language) in &config.languages {
        let path = format!("languages.{}", name);

        if language.image.trim().is_empty() {
            result = result.with_error(ValidationIssue::new(
                format!("{}.image", path),
                "Language profile has no image",
            ));
        }
        if language.extension.trim_start_matches('.').is_empty() {
            result = result.with_error(ValidationIssue::new(
                format!("{}.extension", path),
                "Language profile has no file extension",
            ));
        }
        if language.command.is_empty() {
            result = result.with_error(ValidationIssue::new(
                format!("{}.command", path),
                "Language profile has an empty command",
            ));
        } else if !language.command.iter().any(|arg| arg.contains("{file}")) {
            result = result.with_warning(
                ValidationIssue::new(
                    format!("{}.command", path),
                    "Command never references the source file",
                )
                .with_suggestion("Add a {file} placeholder where the source path belongs"),
            );
        }
    }

    result
}
