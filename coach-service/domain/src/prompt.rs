use std::fmt::Write;

use crate::{PromptSpec, ScenarioMode, SpeechMetrics};

/// Builds the model instruction for one analysis.
///
/// The output is a pure function of its inputs. The transcript is embedded as
/// a JSON string literal so quotes or braces in the speech cannot escape the
/// surrounding structure, and the locally computed metrics are handed to the
/// model as values it must echo back.
pub fn build_prompt(transcript: &str, mode: ScenarioMode, metrics: &SpeechMetrics) -> PromptSpec {
    let transcript_literal = serde_json::Value::String(transcript.to_string()).to_string();
    let mut prompt = String::with_capacity(transcript_literal.len() + 1536);

    prompt.push_str(
        "You are an experienced speech coach. Your feedback is constructive, specific and encouraging.\n\
         Analyze the speech transcript below.\n\n",
    );

    prompt.push_str("Context:\n");
    let _ = writeln!(prompt, "- Scenario: {}", mode.label());
    let _ = writeln!(prompt, "- Scenario focus: {}", mode.coaching_focus());
    let _ = writeln!(prompt, "- Word count: {}", metrics.word_count);
    let _ = writeln!(
        prompt,
        "- Duration: {} seconds ({:?})",
        metrics.duration_seconds.round() as i64,
        metrics.duration_source
    );
    let _ = writeln!(prompt, "- Words per minute: {}", metrics.words_per_minute);
    let _ = writeln!(prompt, "- Filler words counted: {}", metrics.filler_word_count);
    let _ = writeln!(prompt, "- Transcript (JSON string): {transcript_literal}");

    prompt.push_str(
        "\nTask:\n\
         Reply with a single JSON object and nothing else. Do not add prose before or after it \
         and do not wrap it in markdown code fences.\n\n",
    );

    prompt.push_str("The object must contain exactly these fields:\n{\n");
    let _ = writeln!(prompt, "  \"fillerWordCount\": {},", metrics.filler_word_count);
    let _ = writeln!(prompt, "  \"wordsPerMinute\": {},", metrics.words_per_minute);
    prompt.push_str(
        "  \"clarityScore\": <integer from 1 to 10>,\n  \
         \"positiveFeedback\": \"<one specific, encouraging sentence>\",\n  \
         \"negativeFeedback\": \"<one constructive area for improvement, or null>\",\n  \
         \"improvementSuggestion\": \"<one actionable tip for this scenario>\",\n  \
         \"youtubeSearchQuery\": \"<short YouTube search query supporting the tip>\"\n\
         }\n\n",
    );

    prompt.push_str("Guidelines:\n");
    prompt.push_str(
        "- fillerWordCount and wordsPerMinute were measured already; copy the values above unchanged.\n",
    );
    let _ = writeln!(prompt, "- Focus on {}.", mode.coaching_focus());
    prompt.push_str(
        "- Rate clarity on the coherence of the actual content.\n\
         - Keep every text field to one concise sentence in plain English.\n",
    );

    PromptSpec::new(prompt)
}
