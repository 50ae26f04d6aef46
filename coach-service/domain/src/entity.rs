use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{evaluate_badges, Badge, DomainError};

pub const MIN_NON_WHITESPACE_CHARS: usize = 10;

const YOUTUBE_SEARCH_URL: &str = "https://www.youtube.com/results";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioMode {
    #[default]
    GeneralFeedback,
    JobInterview,
    BusinessPitch,
}

impl ScenarioMode {
    pub const ALL: [ScenarioMode; 3] = [
        ScenarioMode::GeneralFeedback,
        ScenarioMode::JobInterview,
        ScenarioMode::BusinessPitch,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScenarioMode::GeneralFeedback => "General Feedback",
            ScenarioMode::JobInterview => "Job Interview",
            ScenarioMode::BusinessPitch => "Business Pitch",
        }
    }

    /// What the coach should weigh most for this scenario.
    pub fn coaching_focus(self) -> &'static str {
        match self {
            ScenarioMode::GeneralFeedback => "overall delivery, structure and clarity",
            ScenarioMode::JobInterview => {
                "confident, relevant answers and a professional tone"
            }
            ScenarioMode::BusinessPitch => {
                "a persuasive value proposition and a clear call to action"
            }
        }
    }
}

impl fmt::Display for ScenarioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ScenarioMode {
    type Err = DomainError;

    /// Accepts the display label ("Job Interview") or a slug
    /// ("job_interview", "job-interview"), ignoring case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['-', ' '], "_");
        match normalized.as_str() {
            "general_feedback" | "general" => Ok(ScenarioMode::GeneralFeedback),
            "job_interview" | "interview" => Ok(ScenarioMode::JobInterview),
            "business_pitch" | "pitch" => Ok(ScenarioMode::BusinessPitch),
            _ => Err(DomainError::UnknownScenario(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptInput {
    pub text: String,
    pub mode: ScenarioMode,
    pub measured_duration_seconds: Option<f64>,
}

impl TranscriptInput {
    pub fn new(text: impl Into<String>, mode: ScenarioMode) -> Self {
        Self {
            text: text.into(),
            mode,
            measured_duration_seconds: None,
        }
    }

    pub fn with_measured_duration(mut self, seconds: f64) -> Self {
        self.measured_duration_seconds = Some(seconds);
        self
    }

    pub fn non_whitespace_chars(&self) -> usize {
        self.text.chars().filter(|ch| !ch.is_whitespace()).count()
    }

    pub fn ensure_analyzable(&self) -> Result<(), DomainError> {
        let actual = self.non_whitespace_chars();
        if actual < MIN_NON_WHITESPACE_CHARS {
            return Err(DomainError::InputTooShort {
                actual,
                minimum: MIN_NON_WHITESPACE_CHARS,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    Measured,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechMetrics {
    pub word_count: usize,
    pub estimated_duration_seconds: f64,
    pub duration_seconds: f64,
    pub duration_source: DurationSource,
    pub words_per_minute: u32,
    pub filler_word_count: u32,
}

/// Model input text. Built once per request and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec(String);

impl PromptSpec {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PromptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub filler_word_count: u32,
    pub words_per_minute: u32,
    pub clarity_score: u8,
    pub positive_feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_feedback: Option<String>,
    pub improvement_suggestion: String,
    #[serde(default)]
    pub youtube_search_query: String,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl AnalysisResult {
    /// Search link for the learn-more affordance, absent when the model gave
    /// no query.
    pub fn learn_more_url(&self) -> Option<String> {
        let query = self.youtube_search_query.trim();
        if query.is_empty() {
            return None;
        }
        url::Url::parse_with_params(YOUTUBE_SEARCH_URL, &[("search_query", query)])
            .ok()
            .map(String::from)
    }

    /// Replaces the model-reported counts with the locally computed ones and
    /// re-derives badges from the corrected record.
    pub fn with_local_metrics(mut self, metrics: &SpeechMetrics) -> Self {
        self.filler_word_count = metrics.filler_word_count;
        self.words_per_minute = metrics.words_per_minute;
        self.badges = evaluate_badges(&self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            filler_word_count: 5,
            words_per_minute: 170,
            clarity_score: 9,
            positive_feedback: "Clear delivery".to_string(),
            negative_feedback: Some("Too fast".to_string()),
            improvement_suggestion: "Slow down".to_string(),
            youtube_search_query: "public speaking pacing".to_string(),
            badges: vec![Badge::ClarityChampion],
        }
    }

    #[test]
    fn scenario_mode_parses_labels_and_slugs() {
        assert_eq!(
            "Job Interview".parse::<ScenarioMode>().expect("label"),
            ScenarioMode::JobInterview
        );
        assert_eq!(
            "business-pitch".parse::<ScenarioMode>().expect("slug"),
            ScenarioMode::BusinessPitch
        );
        assert_eq!(
            "GENERAL_FEEDBACK".parse::<ScenarioMode>().expect("upper slug"),
            ScenarioMode::GeneralFeedback
        );
        assert!(matches!(
            "karaoke".parse::<ScenarioMode>(),
            Err(DomainError::UnknownScenario(_))
        ));
    }

    #[test]
    fn short_transcripts_are_not_analyzable() {
        let input = TranscriptInput::new("  um   ok  so  ", ScenarioMode::GeneralFeedback);
        assert_eq!(input.non_whitespace_chars(), 6);
        assert_eq!(
            input.ensure_analyzable(),
            Err(DomainError::InputTooShort {
                actual: 6,
                minimum: MIN_NON_WHITESPACE_CHARS
            })
        );

        let input = TranscriptInput::new("a b c d e f g h i j", ScenarioMode::GeneralFeedback);
        assert!(input.ensure_analyzable().is_ok());
    }

    #[test]
    fn learn_more_url_is_omitted_for_blank_query() {
        let mut result = sample_result();
        assert_eq!(
            result.learn_more_url().as_deref(),
            Some("https://www.youtube.com/results?search_query=public+speaking+pacing")
        );

        result.youtube_search_query = "   ".to_string();
        assert_eq!(result.learn_more_url(), None);
    }

    #[test]
    fn local_metrics_override_model_counts() {
        let metrics = SpeechMetrics {
            word_count: 50,
            estimated_duration_seconds: 20.0,
            duration_seconds: 20.0,
            duration_source: DurationSource::Estimated,
            words_per_minute: 150,
            filler_word_count: 1,
        };

        let result = sample_result().with_local_metrics(&metrics);

        assert_eq!(result.filler_word_count, 1);
        assert_eq!(result.words_per_minute, 150);
        assert_eq!(
            result.badges,
            vec![Badge::ClarityChampion, Badge::EloquentSpeaker, Badge::PacePro]
        );
    }

    #[test]
    fn analysis_result_serializes_with_schema_keys() {
        let value = serde_json::to_value(sample_result()).expect("serializes");
        assert_eq!(value["fillerWordCount"], 5);
        assert_eq!(value["clarityScore"], 9);
        assert_eq!(value["youtubeSearchQuery"], "public speaking pacing");
        assert_eq!(value["badges"][0], "Clarity Champion");
    }
}
