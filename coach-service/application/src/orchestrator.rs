use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use coach_domain::{AnalysisError, AnalysisResult, ScenarioMode, SpeechMetrics, TranscriptInput};

use crate::{AnalysisOutcome, AnalyzeTranscriptUseCase};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedAnalysis {
    pub session_id: String,
    pub mode: ScenarioMode,
    pub metrics: SpeechMetrics,
    pub result: AnalysisResult,
}

/// Holds at most one outcome: a result or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Idle,
    Running { request_id: u64, session_id: String },
    Succeeded(Box<CompletedAnalysis>),
    Failed { session_id: Option<String>, error: AnalysisError },
}

impl AnalysisState {
    pub fn is_running(&self) -> bool {
        matches!(self, AnalysisState::Running { .. })
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("an analysis is already running")]
    Busy,

    #[error("analysis request {request_id} was superseded")]
    Superseded { request_id: u64 },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

struct ActiveRequest {
    request_id: u64,
    cancel: CancellationToken,
}

struct Inner {
    state: AnalysisState,
    next_request_id: u64,
    active: Option<ActiveRequest>,
}

/// Single-flight driver of the analysis pipeline.
///
/// A submission is accepted only from a non-running state. Each accepted
/// submission gets a fresh request id; a completion whose id is no longer
/// the active one is dropped without touching the state.
pub struct AnalysisOrchestrator {
    usecase: Arc<dyn AnalyzeTranscriptUseCase>,
    inner: Mutex<Inner>,
}

impl AnalysisOrchestrator {
    pub fn new(usecase: Arc<dyn AnalyzeTranscriptUseCase>) -> Self {
        Self {
            usecase,
            inner: Mutex::new(Inner {
                state: AnalysisState::Idle,
                next_request_id: 1,
                active: None,
            }),
        }
    }

    pub async fn submit(
        &self,
        input: TranscriptInput,
        session_id: Option<String>,
    ) -> Result<CompletedAnalysis, SubmitError> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mode = input.mode;
        let (request_id, cancel) = self.begin(&input, &session_id)?;
        let _release = RunningRelease {
            orchestrator: self,
            request_id,
        };

        tracing::info!(request_id, session_id = %session_id, mode = %mode, "analysis started");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(request_id, session_id = %session_id, "analysis cancelled");
                return Err(SubmitError::Superseded { request_id });
            }
            outcome = self.usecase.analyze(input) => outcome,
        };

        self.finish(request_id, session_id, mode, outcome)
    }

    /// Cancels any in-flight request and clears the last outcome.
    pub fn retry(&self) {
        let mut inner = self.lock();
        if let Some(active) = inner.active.take() {
            tracing::info!(request_id = active.request_id, "cancelling in-flight analysis");
            active.cancel.cancel();
        }
        inner.state = AnalysisState::Idle;
    }

    pub fn snapshot(&self) -> AnalysisState {
        self.lock().state.clone()
    }

    fn begin(
        &self,
        input: &TranscriptInput,
        session_id: &str,
    ) -> Result<(u64, CancellationToken), SubmitError> {
        let mut inner = self.lock();
        if inner.state.is_running() {
            tracing::warn!(session_id = %session_id, "rejecting submission while analysis is running");
            return Err(SubmitError::Busy);
        }

        if let Err(err) = self.usecase.preflight(input) {
            let error = err.to_analysis_error();
            tracing::warn!(
                session_id = %session_id,
                kind = ?error.kind,
                detail = error.detail.as_deref().unwrap_or_default(),
                "analysis rejected before request"
            );
            inner.state = AnalysisState::Failed {
                session_id: Some(session_id.to_string()),
                error: error.clone(),
            };
            return Err(SubmitError::Analysis(error));
        }

        let request_id = inner.next_request_id;
        inner.next_request_id += 1;
        let cancel = CancellationToken::new();
        inner.active = Some(ActiveRequest {
            request_id,
            cancel: cancel.clone(),
        });
        inner.state = AnalysisState::Running {
            request_id,
            session_id: session_id.to_string(),
        };
        Ok((request_id, cancel))
    }

    fn finish(
        &self,
        request_id: u64,
        session_id: String,
        mode: ScenarioMode,
        outcome: Result<AnalysisOutcome, crate::ApplicationError>,
    ) -> Result<CompletedAnalysis, SubmitError> {
        let mut inner = self.lock();
        let is_current = inner
            .active
            .as_ref()
            .is_some_and(|active| active.request_id == request_id);
        if !is_current {
            tracing::info!(request_id, session_id = %session_id, "discarding stale analysis result");
            return Err(SubmitError::Superseded { request_id });
        }
        inner.active = None;

        match outcome {
            Ok(AnalysisOutcome { metrics, result }) => {
                let completed = CompletedAnalysis {
                    session_id,
                    mode,
                    metrics,
                    result,
                };
                tracing::info!(
                    request_id,
                    session_id = %completed.session_id,
                    clarity_score = completed.result.clarity_score,
                    "analysis succeeded"
                );
                inner.state = AnalysisState::Succeeded(Box::new(completed.clone()));
                Ok(completed)
            }
            Err(err) => {
                let error = err.to_analysis_error();
                tracing::error!(
                    request_id,
                    session_id = %session_id,
                    kind = ?error.kind,
                    detail = error.detail.as_deref().unwrap_or_default(),
                    "analysis failed"
                );
                inner.state = AnalysisState::Failed {
                    session_id: Some(session_id),
                    error: error.clone(),
                };
                Err(SubmitError::Analysis(error))
            }
        }
    }

    /// Returns to `Idle` if `request_id` is still the active request, which
    /// only happens when its `submit` future was dropped before finishing.
    fn release_abandoned(&self, request_id: u64) {
        let mut inner = self.lock();
        let abandoned = inner
            .active
            .as_ref()
            .is_some_and(|active| active.request_id == request_id);
        if !abandoned {
            return;
        }
        if let Some(active) = inner.active.take() {
            active.cancel.cancel();
        }
        inner.state = AnalysisState::Idle;
        tracing::warn!(request_id, "caller dropped a running analysis, state cleared");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held for the lifetime of one accepted `submit` call.
struct RunningRelease<'a> {
    orchestrator: &'a AnalysisOrchestrator,
    request_id: u64,
}

impl Drop for RunningRelease<'_> {
    fn drop(&mut self) {
        self.orchestrator.release_abandoned(self.request_id);
    }
}
