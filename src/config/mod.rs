//! Configuration module
//!
//! Configuration is split into focused modules:
//! - types/mod.rs: Core configuration types (Config, ServerConfig)
//! - types/sandbox.rs: Sandbox limits and workspace placement
//! - types/language.rs: Configured language profiles
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{Config, ServerConfig};

// Re-export section types
pub use types::language::LanguageConfig;
pub use types::sandbox::{parse_memory_limit, PathTranslation, SandboxConfig};

// Re-export IO and utilities
pub use io::{
    apply_env_overrides, apply_overrides_from, load_config, load_config_from_path,
    read_config_snapshot, save_config, ConfigSnapshot,
};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
