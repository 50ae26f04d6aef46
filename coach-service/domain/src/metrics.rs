use std::sync::LazyLock;

use regex::Regex;

use crate::{DurationSource, SpeechMetrics};

pub const FILLER_WORDS: [&str; 8] = [
    "um",
    "uh",
    "like",
    "you know",
    "so",
    "actually",
    "basically",
    "literally",
];

/// Average speaking rate assumed when no measured duration is available.
pub const ESTIMATED_WORDS_PER_SECOND: f64 = 2.5;

static FILLER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    FILLER_WORDS
        .iter()
        .map(|entry| filler_pattern(entry))
        .collect()
});

// Whole-word, case-insensitive; multi-word entries tolerate any whitespace run.
fn filler_pattern(entry: &str) -> Regex {
    let body = entry
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Regex::new(&format!(r"(?i)\b{body}\b")).expect("filler lexicon entries are valid patterns")
}

pub fn compute_metrics(transcript: &str, measured_duration_seconds: Option<f64>) -> SpeechMetrics {
    let word_count = transcript.split_whitespace().count();
    let estimated_duration_seconds = word_count as f64 / ESTIMATED_WORDS_PER_SECOND;
    let (duration_seconds, duration_source) = match measured_duration_seconds {
        Some(seconds) => (seconds, DurationSource::Measured),
        None => (estimated_duration_seconds, DurationSource::Estimated),
    };

    SpeechMetrics {
        word_count,
        estimated_duration_seconds,
        duration_seconds,
        duration_source,
        words_per_minute: words_per_minute(word_count, duration_seconds),
        filler_word_count: count_filler_words(transcript),
    }
}

pub fn words_per_minute(word_count: usize, duration_seconds: f64) -> u32 {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return 0;
    }
    (word_count as f64 / (duration_seconds / 60.0)).round() as u32
}

/// Sum of matches over every lexicon entry. Entries are counted
/// independently, so overlapping entries are not deduplicated.
pub fn count_filler_words(transcript: &str) -> u32 {
    FILLER_PATTERNS
        .iter()
        .map(|pattern| pattern.find_iter(transcript).count() as u32)
        .sum()
}
