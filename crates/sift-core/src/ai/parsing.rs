//! JSON parsing helpers for remote batch replies
//!
//! The model is asked for a bare JSON array, but replies are still checked
//! entry by entry: a malformed entry is dropped on its own so the rest of the
//! batch survives. Only a reply with no usable top-level structure fails as a
//! whole.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{truncate, RemoteError};
use crate::models::Category;

use super::types::RemoteAnswer;

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("valid regex"))
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    match code_fence_re().captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text,
    }
}

/// Parse a batch classification reply into usable answers, in reply order
///
/// Fails with a parse error when the text is empty, is not JSON, or is a JSON
/// value other than an array or a single object.
pub fn parse_batch_response(text: &str) -> Result<Vec<RemoteAnswer>, RemoteError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(RemoteError::parse("Empty response from model"));
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        RemoteError::parse(format!(
            "Invalid JSON from model: {} | Raw: {}",
            e,
            truncate(body, 200)
        ))
    })?;

    let entries = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(RemoteError::parse(format!(
                "Expected a JSON array of classifications, got {}",
                json_type_name(&other)
            )))
        }
    };

    let answers = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match parse_entry(entry) {
            Ok(answer) => Some(answer),
            Err(reason) => {
                debug!(index = i, reason = %reason, "Dropping malformed classification entry");
                None
            }
        })
        .collect();

    Ok(answers)
}

/// Validate a single reply entry
fn parse_entry(entry: &Value) -> Result<RemoteAnswer, String> {
    let obj = entry
        .as_object()
        .ok_or_else(|| format!("entry is {}, not an object", json_type_name(entry)))?;

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
        Some(_) => return Err("id is not a string".to_string()),
        None => return Err("missing id".to_string()),
    };

    let category: Category = obj
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing category for {}", id))?
        .parse()?;

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("missing confidence for {}", id))?;

    Ok(RemoteAnswer {
        id,
        category,
        confidence: confidence.clamp(0.0, 1.0),
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteErrorKind;

    #[test]
    fn test_parse_array() {
        let response = r#"[
            {"id": "t1", "category": "Dining", "confidence": 0.95},
            {"id": "t2", "category": "Online Shopping", "confidence": 0.8}
        ]"#;
        let answers = parse_batch_response(response).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].id, "t1");
        assert_eq!(answers[0].category, Category::Dining);
        assert_eq!(answers[1].category, Category::OnlineShopping);
        assert_eq!(answers[1].confidence, 0.8);
    }

    #[test]
    fn test_single_object_is_one_entry() {
        let answers =
            parse_batch_response(r#"{"id": "only", "category": "Gas", "confidence": 0.7}"#)
                .unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].id, "only");
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let response = "```json\n[{\"id\": \"t1\", \"category\": \"Travel\", \"confidence\": 0.9}]\n```";
        let answers = parse_batch_response(response).unwrap();
        assert_eq!(answers[0].category, Category::Travel);
        assert_eq!(strip_code_fence("  [1]  "), "[1]");
    }

    #[test]
    fn test_malformed_entries_are_dropped_individually() {
        let response = r#"[
            {"id": "good", "category": "Rent", "confidence": 0.9},
            {"id": "no_conf", "category": "Rent"},
            {"category": "Rent", "confidence": 0.9},
            {"id": "bad_cat", "category": "Transport", "confidence": 0.9},
            "just a string",
            {"id": "conf_str", "category": "Rent", "confidence": "high"}
        ]"#;
        let answers = parse_batch_response(response).unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].id, "good");
    }

    #[test]
    fn test_numeric_id_and_clamped_confidence() {
        let answers =
            parse_batch_response(r#"[{"id": 42, "category": "healthcare", "confidence": 1.7}]"#)
                .unwrap();
        assert_eq!(answers[0].id, "42");
        assert_eq!(answers[0].category, Category::Healthcare);
        assert_eq!(answers[0].confidence, 1.0);
    }

    #[test]
    fn test_non_json_is_parse_failure() {
        let err = parse_batch_response("Sure! Here are your categories.").unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::ResponseParse);
        assert!(err.message.contains("Invalid JSON"));
    }

    #[test]
    fn test_scalar_top_level_is_parse_failure() {
        for body in ["42", "null", "\"Dining\"", "true"] {
            let err = parse_batch_response(body).unwrap_err();
            assert_eq!(err.kind, RemoteErrorKind::ResponseParse, "{}", body);
        }
    }

    #[test]
    fn test_empty_reply_is_parse_failure() {
        let err = parse_batch_response("   ").unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::ResponseParse);
        assert_eq!(err.message, "Empty response from model");
    }

    #[test]
    fn test_empty_array_is_usable() {
        assert!(parse_batch_response("[]").unwrap().is_empty());
    }
}
