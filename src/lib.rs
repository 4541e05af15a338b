//! # Coderunner
//!
//! Runs untrusted source code inside disposable, resource-bounded containers.
//!
//! ## Features
//!
//! - **Batch execution:** run a program to completion and collect stdout/stderr
//! - **Interactive sessions:** stream a program's terminal over a WebSocket and
//!   feed its stdin
//! - **Bounded sandboxes:** memory ceiling, CPU weight, no network, wall-clock
//!   timeout, guaranteed teardown
//! - **Pluggable languages:** built-in Python, C and Java plus configured profiles

pub mod config;
pub mod error;
pub mod gateway;
pub mod sandbox;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
