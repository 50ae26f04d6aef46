use serde::{Deserialize, Serialize};

use coach_application::AnalyzeTranscriptResponse;
use coach_domain::AnalysisError;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEnvelope {
    pub version: u32,
    #[serde(flatten)]
    pub message: ClientMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    Start {
        #[serde(default)]
        mode: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },
    Transcript {
        text: String,
        #[serde(default)]
        is_final: bool,
    },
    Stop {
        #[serde(default)]
        elapsed_seconds: Option<f64>,
    },
    Retry,
    Ping,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerEnvelope {
    pub version: u32,
    #[serde(flatten)]
    pub message: ServerMessage,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    Ready {
        session_id: String,
    },
    TranscriptUpdate {
        text: String,
    },
    Analysis(Box<AnalyzeTranscriptResponse>),
    Error {
        kind: String,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        missing_fields: Vec<String>,
    },
    Cleared,
    Pong,
}

impl ServerMessage {
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind: kind.to_string(),
            message: message.into(),
            missing_fields: Vec::new(),
        }
    }
}

impl From<AnalysisError> for ServerMessage {
    fn from(error: AnalysisError) -> Self {
        ServerMessage::Error {
            kind: error.kind.as_str().to_string(),
            message: error.message,
            missing_fields: error.missing_fields,
        }
    }
}

impl ServerEnvelope {
    pub fn new(message: ServerMessage) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message,
        }
    }
}
