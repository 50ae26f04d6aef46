use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use coach_domain::{
    build_prompt, compute_metrics, parse_response, AnalysisResult, DomainError,
    GenerationRequest, SpeechMetrics, TextGenerationPort, TranscriptInput,
};

use crate::ApplicationError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const GENERATOR_SERVICE: &str = "gemini";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub metrics: SpeechMetrics,
    pub result: AnalysisResult,
}

#[async_trait]
pub trait AnalyzeTranscriptUseCase: Send + Sync {
    /// Cheap checks that must pass before a request is accepted.
    fn preflight(&self, input: &TranscriptInput) -> Result<(), ApplicationError>;

    async fn analyze(&self, input: TranscriptInput) -> Result<AnalysisOutcome, ApplicationError>;
}

pub struct AnalyzeTranscriptUseCaseImpl {
    generator: Arc<dyn TextGenerationPort>,
    model: String,
    request_timeout: Duration,
}

impl AnalyzeTranscriptUseCaseImpl {
    pub fn new(generator: Arc<dyn TextGenerationPort>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

#[async_trait]
impl AnalyzeTranscriptUseCase for AnalyzeTranscriptUseCaseImpl {
    fn preflight(&self, input: &TranscriptInput) -> Result<(), ApplicationError> {
        input.ensure_analyzable()?;
        self.generator.ensure_configured()?;
        Ok(())
    }

    async fn analyze(&self, input: TranscriptInput) -> Result<AnalysisOutcome, ApplicationError> {
        self.preflight(&input)?;

        let metrics = compute_metrics(&input.text, input.measured_duration_seconds);
        tracing::debug!(
            mode = %input.mode,
            word_count = metrics.word_count,
            duration_seconds = metrics.duration_seconds,
            duration_source = ?metrics.duration_source,
            words_per_minute = metrics.words_per_minute,
            filler_word_count = metrics.filler_word_count,
            "computed speech metrics"
        );

        let prompt = build_prompt(&input.text, input.mode, &metrics);
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt,
        };

        let output = tokio::time::timeout(self.request_timeout, self.generator.generate(request))
            .await
            .map_err(|_| DomainError::Timeout {
                service: GENERATOR_SERVICE.to_string(),
                after_ms: self.request_timeout.as_millis() as u64,
            })??;
        tracing::debug!(reply_chars = output.text.len(), "received model reply");

        let parsed = parse_response(&output.text)?;
        if parsed.filler_word_count != metrics.filler_word_count
            || parsed.words_per_minute != metrics.words_per_minute
        {
            tracing::debug!(
                model_filler_word_count = parsed.filler_word_count,
                local_filler_word_count = metrics.filler_word_count,
                model_words_per_minute = parsed.words_per_minute,
                local_words_per_minute = metrics.words_per_minute,
                "model metrics disagree with local metrics, keeping local values"
            );
        }
        let result = parsed.with_local_metrics(&metrics);

        tracing::debug!(
            clarity_score = result.clarity_score,
            badge_count = result.badges.len(),
            "analysis completed"
        );

        Ok(AnalysisOutcome { metrics, result })
    }
}
