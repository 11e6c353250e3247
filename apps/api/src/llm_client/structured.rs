//! Sanitize-then-parse for structured classifier output.
//!
//! Models sometimes wrap JSON answers in code fences or stray backticks even when
//! told not to. Every stage that expects a record or a list goes through here.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Anything shorter than this after cleaning cannot be a meaningful record.
pub const MIN_STRUCTURED_LEN: usize = 5;

#[derive(Debug, Error)]
pub enum StructuredOutputError {
    #[error("structured output empty or too short ({len} chars)")]
    TooShort { len: usize },

    #[error("structured output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Strips ```json ... ``` / ``` ... ``` fences and leading/trailing backticks.
pub fn sanitize(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(stripped) = strip_prefix_ignore_case(text, "```json") {
        text = stripped;
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    let text = text.trim();
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim_matches('`').trim()
}

/// Sanitizes `raw` and deserializes it as `T`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, StructuredOutputError> {
    let cleaned = sanitize(raw);
    if cleaned.len() < MIN_STRUCTURED_LEN {
        return Err(StructuredOutputError::TooShort { len: cleaned.len() });
    }
    Ok(serde_json::from_str(cleaned)?)
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Record {
        name: String,
        rating: i64,
    }

    #[test]
    fn test_sanitize_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(sanitize(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_sanitize_with_uppercase_tag() {
        let input = "```JSON\n[\"Acme\"]\n```";
        assert_eq!(sanitize(input), "[\"Acme\"]");
    }

    #[test]
    fn test_sanitize_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(sanitize(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_sanitize_stray_backticks() {
        assert_eq!(sanitize("`{\"a\": 1}`"), "{\"a\": 1}");
    }

    #[test]
    fn test_sanitize_no_fences() {
        let input = "  {\"key\": \"value\"}  ";
        assert_eq!(sanitize(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_structured_record() {
        let parsed: Record =
            parse_structured("```json\n{\"name\": \"Stripe\", \"rating\": 6}\n```").unwrap();
        assert_eq!(
            parsed,
            Record {
                name: "Stripe".to_string(),
                rating: 6
            }
        );
    }

    #[test]
    fn test_parse_structured_rejects_too_short() {
        let err = parse_structured::<Record>("```json\n```").unwrap_err();
        assert!(matches!(err, StructuredOutputError::TooShort { len: 0 }));
    }

    #[test]
    fn test_parse_structured_rejects_truncated_record() {
        let err = parse_structured::<Record>("{\"name\": \"Stripe\", \"rat").unwrap_err();
        assert!(matches!(err, StructuredOutputError::Parse(_)));
    }

    #[test]
    fn test_parse_structured_missing_closing_fence() {
        // Unterminated fence still parses when the record itself is complete.
        let parsed: Record = parse_structured("```json\n{\"name\": \"Acme\", \"rating\": 2}").unwrap();
        assert_eq!(parsed.rating, 2);
    }
}
