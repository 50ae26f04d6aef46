use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    InputTooShort,
    ConfigurationMissing,
    TransportFailure,
    MalformedResponse,
    SchemaViolation,
    Unknown,
}

impl AnalysisErrorKind {
    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisErrorKind::InputTooShort => "input_too_short",
            AnalysisErrorKind::ConfigurationMissing => "configuration_missing",
            AnalysisErrorKind::TransportFailure => "transport_failure",
            AnalysisErrorKind::MalformedResponse => "malformed_response",
            AnalysisErrorKind::SchemaViolation => "schema_violation",
            AnalysisErrorKind::Unknown => "unknown",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            AnalysisErrorKind::InputTooShort => {
                "The recording is too short to analyze. Please speak a little longer and try again."
            }
            AnalysisErrorKind::ConfigurationMissing => {
                "The coaching service is not configured yet. Please add an API key and try again."
            }
            AnalysisErrorKind::TransportFailure => {
                "We couldn't reach the coaching service. Check your connection and try again."
            }
            AnalysisErrorKind::MalformedResponse => {
                "The coach sent back a response we couldn't read. Please try again."
            }
            AnalysisErrorKind::SchemaViolation => {
                "The coach's feedback was incomplete. Please try again."
            }
            AnalysisErrorKind::Unknown => "Something went wrong during analysis. Please try again.",
        }
    }
}

/// User-facing failure of one analysis. `detail` keeps the diagnostic text
/// for logs and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    #[serde(skip)]
    pub detail: Option<String>,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind) -> Self {
        Self {
            kind,
            message: kind.user_message().to_string(),
            missing_fields: Vec::new(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Maps a pipeline failure to its user-facing kind by variant.
pub fn classify(error: &DomainError) -> AnalysisError {
    match error {
        DomainError::InputTooShort { .. } => {
            AnalysisError::new(AnalysisErrorKind::InputTooShort).with_detail(error.to_string())
        }
        DomainError::ConfigurationMissing(_) => {
            AnalysisError::new(AnalysisErrorKind::ConfigurationMissing)
                .with_detail(error.to_string())
        }
        DomainError::ExternalService { .. } | DomainError::Timeout { .. } => {
            AnalysisError::new(AnalysisErrorKind::TransportFailure).with_detail(error.to_string())
        }
        DomainError::MalformedResponse(_) => {
            AnalysisError::new(AnalysisErrorKind::MalformedResponse)
                .with_detail(error.to_string())
        }
        DomainError::SchemaViolation { fields, message } => {
            let mut classified = AnalysisError::new(AnalysisErrorKind::SchemaViolation);
            if !fields.is_empty() {
                classified.message = format!("{} ({message})", classified.message);
            }
            classified.missing_fields = fields.clone();
            classified.with_detail(message.clone())
        }
        DomainError::UnknownScenario(_) | DomainError::Capture(_) | DomainError::Internal(_) => {
            AnalysisError::new(AnalysisErrorKind::Unknown).with_detail(error.to_string())
        }
    }
}
