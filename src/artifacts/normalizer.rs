//! Output normalizer.
//!
//! Turns raw generated text into the value an artifact field stores:
//! trimmed text for Markdown artifacts, a parsed JSON value for structured
//! ones. The only repair attempted on JSON output is removing one wrapping
//! code fence.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::llms::preview;

use super::registry::OutputShape;

/// Characters of raw output kept for diagnosis.
pub const SNIPPET_CHARS: usize = 300;

static LEADING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A```[\w+.-]*[ \t]*\r?\n?").unwrap());
static TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?[ \t]*```\z").unwrap());

/// Generated output that could not be coerced into the declared shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed model output: {reason}")]
pub struct MalformedOutput {
    pub reason: String,
    /// First [`SNIPPET_CHARS`] characters of the raw output.
    pub snippet: String,
}

impl MalformedOutput {
    pub fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            snippet: preview(raw, SNIPPET_CHARS),
        }
    }
}

/// A value ready to be written to an artifact field.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    Json(Value),
    Markdown(String),
}

impl NormalizedValue {
    pub fn shape(&self) -> OutputShape {
        match self {
            Self::Json(_) => OutputShape::Json,
            Self::Markdown(_) => OutputShape::Markdown,
        }
    }
}

/// Remove one optional code fence (with optional language tag) around `raw`.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = LEADING_FENCE.find(trimmed).map_or(0, |m| m.end());
    let rest = &trimmed[start..];
    let end = TRAILING_FENCE.find(rest).map_or(rest.len(), |m| m.start());
    rest[..end].trim()
}

/// Normalize `raw` according to `shape`.
pub fn normalize(raw: &str, shape: OutputShape) -> Result<NormalizedValue, MalformedOutput> {
    match shape {
        OutputShape::Markdown => Ok(NormalizedValue::Markdown(raw.trim().to_string())),
        OutputShape::Json => {
            let body = strip_code_fence(raw);
            serde_json::from_str::<Value>(body)
                .map(NormalizedValue::Json)
                .map_err(|e| MalformedOutput::new(format!("output is not valid JSON: {e}"), raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_markdown_is_trimmed_and_stable() {
        let once = normalize("\n\n# Title\n\nBody  \n", OutputShape::Markdown).unwrap();
        assert_eq!(once, NormalizedValue::Markdown("# Title\n\nBody".into()));
        let NormalizedValue::Markdown(text) = &once else { unreachable!() };
        assert_eq!(normalize(text, OutputShape::Markdown).unwrap(), once);
    }

    #[test]
    fn test_markdown_keeps_inner_fences() {
        let raw = "# Doc\n\n```\ncode\n```";
        assert_eq!(
            normalize(raw, OutputShape::Markdown).unwrap(),
            NormalizedValue::Markdown(raw.into())
        );
    }

    #[test]
    fn test_fenced_json_matches_unfenced() {
        let raw = "```json\n{\"score\": 72, \"report\": \"ok\"}\n```";
        assert_eq!(
            normalize(raw, OutputShape::Json).unwrap(),
            NormalizedValue::Json(json!({"score": 72, "report": "ok"}))
        );
        assert_eq!(
            normalize(raw, OutputShape::Json).unwrap(),
            normalize("{\"score\": 72, \"report\": \"ok\"}", OutputShape::Json).unwrap()
        );
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fence("  ```JSON\r\n{}\r\n```  "), "{}");
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_prose_is_malformed_with_snippet() {
        let raw = "Sure! Here is your messaging matrix: tagline is great.";
        let err = normalize(raw, OutputShape::Json).unwrap_err();
        assert_eq!(err.snippet, raw);
        assert!(err.reason.contains("not valid JSON"));
    }

    #[test]
    fn test_snippet_is_capped() {
        let raw = "é".repeat(1000);
        let err = normalize(&raw, OutputShape::Json).unwrap_err();
        assert_eq!(err.snippet.chars().count(), SNIPPET_CHARS);
    }

    #[test]
    fn test_no_heuristic_repair() {
        for raw in ["{'a': 1}", "{\"a\": 1,}", "prefix {\"a\": 1}", "```json\n{\"a\": 1}\n``` trailing"] {
            assert!(normalize(raw, OutputShape::Json).is_err(), "{raw}");
        }
    }
}
