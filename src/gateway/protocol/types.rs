//! HTTP request/response bodies

use serde::{Deserialize, Serialize};

use crate::sandbox::LanguageProfile;

/// Body of `POST /execute` responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl BatchResponse {
    pub fn ok(stdout: String, stderr: String) -> Self {
        BatchResponse {
            success: true,
            stdout,
            stderr,
        }
    }

    pub fn failed(stdout: String, stderr: impl Into<String>) -> Self {
        BatchResponse {
            success: false,
            stdout,
            stderr: stderr.into(),
        }
    }
}

/// Entry of `GET /languages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub image: String,
    pub extension: String,
    pub aliases: Vec<String>,
}

impl From<&LanguageProfile> for LanguageInfo {
    fn from(profile: &LanguageProfile) -> Self {
        LanguageInfo {
            name: profile.name.clone(),
            image: profile.image.clone(),
            extension: profile.extension.clone(),
            aliases: profile.aliases.clone(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        HealthResponse {
            status: "healthy".to_string(),
            service: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }
}
