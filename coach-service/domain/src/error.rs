use thiserror::Error;

/// Failure signaled by a pipeline stage. Each variant is a distinct failure
/// kind so callers can classify without inspecting message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("transcript has {actual} non-whitespace characters, at least {minimum} required")]
    InputTooShort { actual: usize, minimum: usize },

    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("{service} service error: {message}")]
    ExternalService { service: String, message: String },

    #[error("{service} request timed out after {after_ms} ms")]
    Timeout { service: String, after_ms: u64 },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("model response violates schema: {message}")]
    SchemaViolation { fields: Vec<String>, message: String },

    #[error("unknown scenario mode `{0}`")]
    UnknownScenario(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn internal_error(message: &str) -> Self {
        Self::Internal(message.to_string())
    }

    pub fn external_service_error(service: &str, message: &str) -> Self {
        Self::ExternalService {
            service: service.to_string(),
            message: message.to_string(),
        }
    }

    pub fn configuration_missing(what: &str) -> Self {
        Self::ConfigurationMissing(what.to_string())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        let message = format!("missing required fields: {}", fields.join(", "));
        Self::SchemaViolation { fields, message }
    }

    pub fn invalid_field(field: &str, reason: &str) -> Self {
        Self::SchemaViolation {
            fields: vec![field.to_string()],
            message: format!("field `{field}` {reason}"),
        }
    }

    pub fn capture(message: &str) -> Self {
        Self::Capture(message.to_string())
    }
}
