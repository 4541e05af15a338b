//! Interactive session wire format
//!
//! Every frame is a JSON text message tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::sandbox::OutputChannel;

/// Message sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Start a program
    Execute {
        #[serde(default)]
        language: String,
        #[serde(default)]
        code: String,
    },
    /// Text for the program's stdin
    #[serde(alias = "stdin")]
    Input {
        #[serde(default)]
        data: String,
    },
}

impl ClientMessage {
    /// Parse a text frame
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Message sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Terminal output and session notices
    Output { data: String },
    /// Program stdout of a sandbox without a TTY
    Stdout { data: String },
    /// Program stderr of a sandbox without a TTY
    Stderr { data: String },
}

impl ServerMessage {
    pub fn output(data: impl Into<String>) -> Self {
        ServerMessage::Output { data: data.into() }
    }

    /// Wrap decoded text from `channel`
    pub fn from_channel(channel: OutputChannel, data: String) -> Self {
        match channel {
            OutputChannel::Console => ServerMessage::Output { data },
            OutputChannel::Stdout => ServerMessage::Stdout { data },
            OutputChannel::Stderr => ServerMessage::Stderr { data },
        }
    }

    pub fn data(&self) -> &str {
        match self {
            ServerMessage::Output { data }
            | ServerMessage::Stdout { data }
            | ServerMessage::Stderr { data } => data,
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> String {
        // A tagged enum of strings always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}
