use axum::{extract::State, http::StatusCode, response::Json};

use coach_application::{AnalysisStateView, AnalyzeTranscriptRequest, AnalyzeTranscriptResponse};

use crate::{AppState, HttpError, ValidatedJson};

pub async fn analyze_transcript(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AnalyzeTranscriptRequest>,
) -> Result<(StatusCode, Json<AnalyzeTranscriptResponse>), HttpError> {
    tracing::info!(
        transcript_chars = request.transcript.len(),
        mode = request.mode.as_deref().unwrap_or("default"),
        duration_seconds = request.duration_seconds.unwrap_or(0.0),
        session_id = request.session_id.as_deref().unwrap_or("auto"),
        "received analysis request"
    );

    let (input, session_id) = request.into_input()?;
    match state.orchestrator.submit(input, session_id).await {
        Ok(completed) => {
            tracing::info!(
                session_id = %completed.session_id,
                badge_count = completed.result.badges.len(),
                "analysis request completed"
            );
            Ok((StatusCode::OK, Json(completed.into())))
        }
        Err(error) => {
            tracing::warn!(error = %error, "analysis request failed");
            Err(error.into())
        }
    }
}

pub async fn analysis_state(State(state): State<AppState>) -> Json<AnalysisStateView> {
    Json(state.orchestrator.snapshot().into())
}

pub async fn retry_analysis(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.retry();
    tracing::info!("analysis state cleared");
    StatusCode::NO_CONTENT
}
