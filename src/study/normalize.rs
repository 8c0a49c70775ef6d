// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Coercion of raw backend output into `CanonicalResult`.
//!
//! Single quiz items that cannot be coerced are dropped silently. Only an
//! empty batch, or empty notes, fails a payload.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::{CanonicalResult, QuizItem, RawOnDeviceText, RawPayload, RawServerPayload, OPTION_COUNT};

const QUESTION_FIELDS: &[&str] = &["question", "prompt", "q"];
const OPTION_FIELDS: &[&str] = &["options", "choices", "answers"];
const ANSWER_FIELDS: &[&str] = &[
    "correct_index",
    "correctIndex",
    "answer_index",
    "answerIndex",
    "answer",
];
const EXPLANATION_FIELDS: &[&str] = &["explanation", "rationale"];

pub const UNKNOWN_LANGUAGE: &str = "Unknown";
pub const REMOTE_ORIGIN: &str = "Remote server";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("no valid quiz items in payload")]
    EmptyQuiz,

    #[error("notes are empty")]
    EmptyNotes,
}

/// Normalize a loosely-typed quiz batch, preserving input order.
pub fn normalize_quiz(raw_items: &[Value]) -> Vec<QuizItem> {
    raw_items.iter().filter_map(normalize_item).collect()
}

fn normalize_item(raw: &Value) -> Option<QuizItem> {
    let obj = raw.as_object()?;

    let question = QUESTION_FIELDS
        .iter()
        .filter_map(|f| obj.get(*f))
        .map(scalar_text)
        .find(|s| !s.is_empty())?;

    let options: Vec<String> = OPTION_FIELDS
        .iter()
        .find_map(|f| obj.get(*f).and_then(Value::as_array))?
        .iter()
        .map(scalar_text)
        .filter(|s| !s.is_empty())
        .collect();
    if options.len() != OPTION_COUNT {
        return None;
    }

    let answer = ANSWER_FIELDS
        .iter()
        .filter_map(|f| obj.get(*f))
        .find(|v| !v.is_null())?;
    let correct_index = resolve_answer(answer, &options)?;

    let explanation = EXPLANATION_FIELDS
        .iter()
        .filter_map(|f| obj.get(*f))
        .map(scalar_text)
        .find(|s| !s.is_empty())
        .unwrap_or_default();

    Some(QuizItem {
        question,
        options,
        correct_index,
        explanation,
    })
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Resolve the correct-answer field to a 0-based option index.
///
/// Tried in order: letter A-D, numeric value, case-insensitive option text.
/// A value of `len` is read as 1-based and shifted down by one.
fn resolve_answer(answer: &Value, options: &[String]) -> Option<usize> {
    let raw_index: f64 = match answer {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned = s.trim();
            letter_index(cleaned)
                .map(|i| i as f64)
                .or_else(|| leading_integer(cleaned).map(|n| n as f64))
                .or_else(|| {
                    options
                        .iter()
                        .position(|opt| opt.to_lowercase() == cleaned.to_lowercase())
                        .map(|i| i as f64)
                })?
        }
        _ => return None,
    };

    if !raw_index.is_finite() {
        return None;
    }
    let rounded = raw_index.round();
    let len = options.len() as f64;
    if rounded < 0.0 || rounded > len {
        return None;
    }
    let mut index = rounded as usize;
    if index > options.len() - 1 {
        // Only reachable for index == len: a 1-based answer.
        index -= 1;
    }
    Some(index)
}

fn letter_index(s: &str) -> Option<usize> {
    match s.to_ascii_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}

/// Integer prefix of `s` (optional sign, then digits), like a lenient parseInt.
fn leading_integer(s: &str) -> Option<i64> {
    let digits_start = usize::from(s.starts_with(['-', '+']));
    let digits_len = s[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    s[..digits_start + digits_len].parse().ok()
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?i)```(?:json)?").expect("static regex"))
}

/// Strip code fences and keep the outermost `[...]` span.
fn clean_json_block(text: &str) -> String {
    let cleaned = fence_pattern().replace_all(text, "");
    let cleaned = cleaned.trim();
    match (cleaned.find('['), cleaned.rfind(']')) {
        (Some(start), Some(end)) if end > start => cleaned[start..=end].to_string(),
        _ => cleaned.to_string(),
    }
}

/// Parse free-form model output into quiz items.
///
/// Returns an empty vector when no usable structure is found; callers treat
/// that as a normalization failure.
pub fn parse_raw_quiz_payload(text: &str) -> Vec<QuizItem> {
    let cleaned = clean_json_block(text);
    let parsed = serde_json::from_str::<Value>(&cleaned).or_else(|_| {
        let flattened = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        serde_json::from_str::<Value>(&flattened)
    });
    match parsed {
        Ok(Value::Array(items)) => normalize_quiz(&items),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::debug!(error = %e, "quiz payload is not valid JSON");
            Vec::new()
        }
    }
}

/// Reduce a language-detection reply to a language name.
pub fn parse_language_label(reply: &str) -> String {
    let first = reply.split([':', '-']).next().unwrap_or_default();
    let label = first.lines().next().unwrap_or_default().trim().trim_matches(['.', '"', '*']);
    if label.is_empty() {
        UNKNOWN_LANGUAGE.to_string()
    } else {
        label.to_string()
    }
}

/// Normalize whichever payload a strategy produced.
///
/// `source_word_count` is the prepared transcript's word count, used when
/// the backend does not report one.
pub fn normalize_payload(
    raw: RawPayload,
    source_word_count: usize,
) -> Result<CanonicalResult, NormalizationError> {
    match raw {
        RawPayload::Server(payload) => normalize_server(payload, source_word_count),
        RawPayload::OnDevice(text) => normalize_on_device(text, source_word_count),
    }
}

fn normalize_server(
    payload: RawServerPayload,
    source_word_count: usize,
) -> Result<CanonicalResult, NormalizationError> {
    let quiz = normalize_quiz(&payload.quiz);
    let notes = payload.notes_markdown.trim().to_string();
    check_required(&notes, &quiz)?;

    Ok(CanonicalResult {
        notes_markdown: notes,
        study_plan_markdown: non_empty(payload.study_plan_markdown),
        quiz,
        source_language: non_empty(payload.source_language)
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
        source_word_count: payload.source_word_count.unwrap_or(source_word_count),
        origin_label: REMOTE_ORIGIN.to_string(),
    })
}

fn normalize_on_device(
    text: RawOnDeviceText,
    source_word_count: usize,
) -> Result<CanonicalResult, NormalizationError> {
    let quiz = parse_raw_quiz_payload(&text.quiz_reply);
    let notes = text.notes_reply.trim().to_string();
    check_required(&notes, &quiz)?;

    Ok(CanonicalResult {
        notes_markdown: notes,
        study_plan_markdown: non_empty(text.plan_reply),
        quiz,
        source_language: text
            .language_reply
            .as_deref()
            .map(parse_language_label)
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
        source_word_count,
        origin_label: text.origin,
    })
}

fn check_required(notes: &str, quiz: &[QuizItem]) -> Result<(), NormalizationError> {
    if quiz.is_empty() {
        return Err(NormalizationError::EmptyQuiz);
    }
    if notes.is_empty() {
        return Err(NormalizationError::EmptyNotes);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("2"), Some(2));
        assert_eq!(leading_integer("3) Paris"), Some(3));
        assert_eq!(leading_integer("-1"), Some(-1));
        assert_eq!(leading_integer("Paris"), None);
    }

    #[test]
    fn test_clean_json_block_strips_fences_and_prose() {
        let text = "Here you go:\n```JSON\n[{\"a\":1}]\n```\nEnjoy!";
        assert_eq!(clean_json_block(text), "[{\"a\":1}]");
    }

    #[test]
    fn test_resolve_answer_fractional_rounds() {
        let options: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_answer(&json!(1.6), &options), Some(2));
        assert_eq!(resolve_answer(&json!(-1), &options), None);
        assert_eq!(resolve_answer(&json!(5), &options), None);
        assert_eq!(resolve_answer(&json!(true), &options), None);
    }

    #[test]
    fn test_parse_language_label() {
        assert_eq!(parse_language_label("English"), "English");
        assert_eq!(parse_language_label("Hindi: high confidence"), "Hindi");
        assert_eq!(parse_language_label("Spanish - confident"), "Spanish");
        assert_eq!(parse_language_label("  \n"), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_array_inside_wrapper_object_is_extracted() {
        let text = r#"{"quiz":[{"question":"Q","options":["a","b","c","d"],"answer":"a"}]}"#;
        let items = parse_raw_quiz_payload(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].correct_index, 0);
    }
}
