use serde::{Deserialize, Serialize};
use validator::Validate;

use coach_domain::{AnalysisError, AnalysisResult, ScenarioMode, SpeechMetrics, TranscriptInput};

use crate::{AnalysisState, ApplicationError, CompletedAnalysis};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnalyzeTranscriptRequest {
    #[validate(length(max = 20_000))]
    pub transcript: String,
    /// Display label or slug; defaults to general feedback.
    pub mode: Option<String>,
    #[validate(range(min = 0.0, max = 7_200.0))]
    pub duration_seconds: Option<f64>,
    #[validate(length(min = 1, max = 64))]
    pub session_id: Option<String>,
}

impl AnalyzeTranscriptRequest {
    pub fn into_input(self) -> Result<(TranscriptInput, Option<String>), ApplicationError> {
        let mode = match self.mode.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw
                .parse::<ScenarioMode>()
                .map_err(|e| ApplicationError::Validation(e.to_string()))?,
            _ => ScenarioMode::default(),
        };
        let mut input = TranscriptInput::new(self.transcript, mode);
        if let Some(seconds) = self.duration_seconds {
            input = input.with_measured_duration(seconds);
        }
        Ok((input, self.session_id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeTranscriptResponse {
    pub session_id: String,
    pub mode: ScenarioMode,
    pub metrics: SpeechMetrics,
    pub result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learn_more_url: Option<String>,
}

impl From<CompletedAnalysis> for AnalyzeTranscriptResponse {
    fn from(completed: CompletedAnalysis) -> Self {
        let learn_more_url = completed.result.learn_more_url();
        Self {
            session_id: completed.session_id,
            mode: completed.mode,
            metrics: completed.metrics,
            result: completed.result,
            learn_more_url,
        }
    }
}

/// Orchestrator state as exposed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisStateView {
    Idle,
    Running { session_id: String },
    Succeeded { analysis: Box<AnalyzeTranscriptResponse> },
    Failed { session_id: Option<String>, error: AnalysisError },
}

impl From<AnalysisState> for AnalysisStateView {
    fn from(state: AnalysisState) -> Self {
        match state {
            AnalysisState::Idle => AnalysisStateView::Idle,
            AnalysisState::Running { session_id, .. } => AnalysisStateView::Running { session_id },
            AnalysisState::Succeeded(completed) => AnalysisStateView::Succeeded {
                analysis: Box::new((*completed).into()),
            },
            AnalysisState::Failed { session_id, error } => {
                AnalysisStateView::Failed { session_id, error }
            }
        }
    }
}
