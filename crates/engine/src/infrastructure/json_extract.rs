//! The Tolerant JSON Extractor (C3).
//!
//! Grounded on `original_source`'s `OutputParser.parse` algorithm (fenced
//! block -> first balanced `{...}` -> first balanced `[...]` -> whole
//! text), implemented in the teacher's `regex_lite` + `LazyLock` idiom
//! (`use_cases/queues/response_parser.rs`).

use std::sync::LazyLock;

use regex_lite::Regex;
use thiserror::Error;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

#[derive(Debug, Error)]
#[error("could not extract json from llm output: {preview}")]
pub struct ParseError {
    pub preview: String,
}

impl ParseError {
    fn from_text(text: &str) -> Self {
        let preview: String = text.chars().take(500).collect();
        Self { preview }
    }
}

/// Recovers a JSON value from arbitrary LLM text by trying, in order:
/// fenced ```json blocks, the first balanced `{...}` substring, the first
/// balanced `[...]` substring, the entire stripped text.
pub fn extract_json(text: &str) -> Result<serde_json::Value, ParseError> {
    if let Some(caps) = FENCED_JSON_RE.captures(text) {
        if let Some(inner) = caps.get(1) {
            if let Ok(value) = serde_json::from_str(inner.as_str().trim()) {
                return Ok(value);
            }
        }
    }

    if let Some(candidate) = first_balanced_substring(text, '{', '}') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&candidate) {
            return Ok(value);
        }
    }

    if let Some(candidate) = first_balanced_substring(text, '[', ']') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&candidate) {
            return Ok(value);
        }
    }

    serde_json::from_str(text.trim()).map_err(|_| ParseError::from_text(text))
}

/// Scans for the first `open`...`close` span whose nesting depth returns to
/// zero, returning the substring including both delimiters.
fn first_balanced_substring(text: &str, open: char, close: char) -> Option<String> {
    let bytes: Vec<char> = text.chars().collect();
    let start = bytes.iter().position(|&c| c == open)?;
    let mut depth = 0i32;
    for (offset, &c) in bytes[start..].iter().enumerate() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                let end = start + offset + 1;
                return Some(bytes[start..end].iter().collect());
            }
        }
    }
    None
}

/// Deserializes the extracted value into `T`, reporting a `ShapeMismatch`
/// via the caller's own error type when it fails. Kept separate from
/// `extract_json` so callers can attach their own error context.
pub fn extract_and_deserialize<T: serde::de::DeserializeOwned>(
    text: &str,
) -> Result<T, ParseError> {
    let value = extract_json(text)?;
    serde_json::from_value(value).map_err(|_| ParseError::from_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_fenced_json_block() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks.";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn extracts_balanced_object_amid_prose() {
        let text = "Sure, the result is {\"a\": 1, \"b\": [1,2]} and that's final.";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 1, "b": [1, 2]}));
    }

    #[test]
    fn extracts_balanced_array_when_no_object_present() {
        let text = "The tropes are [\"a\", \"b\"] as requested.";
        assert_eq!(extract_json(text).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn falls_back_to_whole_text() {
        let text = "  {\"a\": 1}  ";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn reports_preview_on_total_failure() {
        let text = "this is not json at all, just prose.";
        let err = extract_json(text).unwrap_err();
        assert!(err.preview.contains("this is not json"));
    }

    #[test]
    fn preview_is_capped_at_500_chars() {
        let text = "x".repeat(2000);
        let err = extract_json(&text).unwrap_err();
        assert_eq!(err.preview.chars().count(), 500);
    }
}
