use coach_domain::{classify, AnalysisError, AnalysisErrorKind, DomainError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    pub fn to_analysis_error(&self) -> AnalysisError {
        match self {
            ApplicationError::Domain(err) => classify(err),
            ApplicationError::Validation(message) | ApplicationError::Internal(message) => {
                AnalysisError::new(AnalysisErrorKind::Unknown).with_detail(message.clone())
            }
        }
    }
}

impl From<ApplicationError> for AnalysisError {
    fn from(error: ApplicationError) -> Self {
        error.to_analysis_error()
    }
}
