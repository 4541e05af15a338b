//! Gateway protocol
//!
//! - [`schema`]: JSON frames exchanged over the interactive WebSocket
//! - [`types`]: HTTP bodies of the batch, language and health endpoints

pub mod schema;
pub mod types;

pub use schema::{ClientMessage, ServerMessage};
pub use types::{BatchResponse, HealthResponse, LanguageInfo};
