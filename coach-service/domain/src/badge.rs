use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AnalysisResult;

pub const CLARITY_CHAMPION_MIN_SCORE: u8 = 8;
pub const ELOQUENT_SPEAKER_MAX_FILLERS: u32 = 2;
pub const PACE_PRO_WPM: std::ops::RangeInclusive<u32> = 120..=150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "Clarity Champion")]
    ClarityChampion,
    #[serde(rename = "Eloquent Speaker")]
    EloquentSpeaker,
    #[serde(rename = "Pace Pro")]
    PacePro,
}

impl Badge {
    /// Catalog in award order.
    pub const CATALOG: [Badge; 3] = [Badge::ClarityChampion, Badge::EloquentSpeaker, Badge::PacePro];

    pub fn name(self) -> &'static str {
        match self {
            Badge::ClarityChampion => "Clarity Champion",
            Badge::EloquentSpeaker => "Eloquent Speaker",
            Badge::PacePro => "Pace Pro",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Badge::ClarityChampion => "🏆",
            Badge::EloquentSpeaker => "🗣️",
            Badge::PacePro => "⏱️",
        }
    }

    fn earned_by(self, result: &AnalysisResult) -> bool {
        match self {
            Badge::ClarityChampion => result.clarity_score >= CLARITY_CHAMPION_MIN_SCORE,
            Badge::EloquentSpeaker => result.filler_word_count <= ELOQUENT_SPEAKER_MAX_FILLERS,
            Badge::PacePro => PACE_PRO_WPM.contains(&result.words_per_minute),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.name())
    }
}

/// Badges earned by `result`, in catalog order. Ignores `result.badges`.
pub fn evaluate_badges(result: &AnalysisResult) -> Vec<Badge> {
    Badge::CATALOG
        .into_iter()
        .filter(|badge| badge.earned_by(result))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(clarity_score: u8, filler_word_count: u32, words_per_minute: u32) -> AnalysisResult {
        AnalysisResult {
            filler_word_count,
            words_per_minute,
            clarity_score,
            positive_feedback: "Good energy".to_string(),
            negative_feedback: None,
            improvement_suggestion: "Pause more".to_string(),
            youtube_search_query: String::new(),
            badges: Vec::new(),
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(
            evaluate_badges(&result(8, 2, 120)),
            vec![Badge::ClarityChampion, Badge::EloquentSpeaker, Badge::PacePro]
        );
        assert_eq!(evaluate_badges(&result(10, 0, 150)).len(), 3);
        assert!(evaluate_badges(&result(7, 3, 119)).is_empty());
        assert!(evaluate_badges(&result(1, 40, 151)).is_empty());
    }

    #[test]
    fn clarity_and_pace_without_fluency() {
        assert_eq!(
            evaluate_badges(&result(9, 5, 130)),
            vec![Badge::ClarityChampion, Badge::PacePro]
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let mut record = result(8, 1, 200);
        let first = evaluate_badges(&record);
        record.badges = first.clone();
        assert_eq!(evaluate_badges(&record), first);
        assert_eq!(evaluate_badges(&record), first);
    }

    #[test]
    fn display_pairs_glyph_and_name() {
        assert_eq!(Badge::PacePro.to_string(), "⏱️ Pace Pro");
        assert_eq!(
            serde_json::to_string(&Badge::EloquentSpeaker).expect("serializes"),
            "\"Eloquent Speaker\""
        );
    }
}
