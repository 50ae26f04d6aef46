use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use coach_application::{ApplicationError, SubmitError};
use coach_domain::{AnalysisError, AnalysisErrorKind};

#[derive(Debug)]
pub enum HttpError {
    Validation { message: String },
    Busy,
    Superseded,
    Analysis(AnalysisError),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::Busy | HttpError::Superseded => StatusCode::CONFLICT,
            HttpError::Analysis(error) => analysis_status(error.kind),
        }
    }
}

pub fn analysis_status(kind: AnalysisErrorKind) -> StatusCode {
    match kind {
        AnalysisErrorKind::InputTooShort => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisErrorKind::ConfigurationMissing => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisErrorKind::TransportFailure
        | AnalysisErrorKind::MalformedResponse
        | AnalysisErrorKind::SchemaViolation => StatusCode::BAD_GATEWAY,
        AnalysisErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            HttpError::Validation { message } => json!({ "kind": "validation", "message": message }),
            HttpError::Busy => json!({
                "kind": "busy",
                "message": "An analysis is already running. Please wait for it to finish.",
            }),
            HttpError::Superseded => json!({
                "kind": "superseded",
                "message": "This analysis was cancelled by a newer request.",
            }),
            HttpError::Analysis(error) => json!(error),
        };

        (status, Json(json!({ "error": body }))).into_response()
    }
}

impl From<SubmitError> for HttpError {
    fn from(error: SubmitError) -> Self {
        match error {
            SubmitError::Busy => HttpError::Busy,
            SubmitError::Superseded { .. } => HttpError::Superseded,
            SubmitError::Analysis(error) => HttpError::Analysis(error),
        }
    }
}

impl From<ApplicationError> for HttpError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Validation(message) => HttpError::Validation { message },
            other => HttpError::Analysis(other.to_analysis_error()),
        }
    }
}
