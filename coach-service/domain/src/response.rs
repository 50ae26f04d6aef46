use serde_json::{Map, Value};

use crate::{evaluate_badges, AnalysisResult, DomainError};

/// Keys the model reply must carry, in schema order.
pub const RESPONSE_FIELDS: [&str; 7] = [
    "fillerWordCount",
    "wordsPerMinute",
    "clarityScore",
    "positiveFeedback",
    "negativeFeedback",
    "improvementSuggestion",
    "youtubeSearchQuery",
];

pub const MIN_CLARITY_SCORE: u8 = 1;
pub const MAX_CLARITY_SCORE: u8 = 10;

/// Turns free model text into a validated [`AnalysisResult`] with badges.
pub fn parse_response(raw: &str) -> Result<AnalysisResult, DomainError> {
    let unfenced = strip_code_fences(raw);
    let span = first_balanced_object(unfenced)
        .ok_or_else(|| DomainError::malformed("no JSON object found in model reply"))?;

    let value: Value = serde_json::from_str(span)
        .map_err(|e| DomainError::malformed(format!("invalid JSON object: {e}")))?;
    let Value::Object(object) = value else {
        return Err(DomainError::malformed("reply is not a JSON object"));
    };

    let missing: Vec<String> = RESPONSE_FIELDS
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DomainError::missing_fields(missing));
    }

    let clarity = read_count(&object, "clarityScore")?
        .clamp(u32::from(MIN_CLARITY_SCORE), u32::from(MAX_CLARITY_SCORE));

    let mut result = AnalysisResult {
        filler_word_count: read_count(&object, "fillerWordCount")?,
        words_per_minute: read_count(&object, "wordsPerMinute")?,
        clarity_score: clarity as u8,
        positive_feedback: required_text(&object, "positiveFeedback")?,
        negative_feedback: optional_text(&object, "negativeFeedback")?,
        improvement_suggestion: required_text(&object, "improvementSuggestion")?,
        youtube_search_query: optional_text(&object, "youtubeSearchQuery")?.unwrap_or_default(),
        badges: Vec::new(),
    };
    result.badges = evaluate_badges(&result);
    Ok(result)
}

/// Drops a leading fence line (with optional language tag) and a trailing fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = match text.find('\n') {
            Some(newline) => &text[newline + 1..],
            None => text.trim_start_matches('`'),
        };
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        text = stripped;
    }
    text.trim()
}

/// First `{...}` span whose braces balance, ignoring braces inside JSON
/// strings. Unbalanced openers are skipped.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(len) = balanced_len(&text[start..]) {
            return Some(&text[start..start + len]);
        }
        search_from = start + 1;
    }
    None
}

fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn read_count(object: &Map<String, Value>, field: &str) -> Result<u32, DomainError> {
    let number = match &object[field] {
        Value::Number(n) => match n.as_u64() {
            Some(unsigned) => return Ok(u32::try_from(unsigned).unwrap_or(u32::MAX)),
            None => n.as_f64(),
        },
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Ok(n.round().clamp(0.0, f64::from(u32::MAX)) as u32),
        _ => Err(DomainError::invalid_field(field, "must be a number")),
    }
}

fn required_text(object: &Map<String, Value>, field: &str) -> Result<String, DomainError> {
    match &object[field] {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(DomainError::invalid_field(field, "must be a non-empty string")),
    }
}

fn optional_text(object: &Map<String, Value>, field: &str) -> Result<Option<String>, DomainError> {
    match &object[field] {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        _ => Err(DomainError::invalid_field(field, "must be a string or null")),
    }
}
