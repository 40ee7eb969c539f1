//! Normalization of loosely-typed profile fields.
//!
//! The setup form submits text fields and list fields whose JSON shape
//! varies by client version: a list may arrive as a JSON array, as a
//! string that looks like a JSON array, or as a comma-separated string.
//! Everything here is pure so the parsing rules are testable in isolation.

use serde_json::Value;
use thiserror::Error;

const MAX_TEXT_CHARS: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("field '{0}' must be a string or a list of strings")]
    UnsupportedShape(String),
}

/// Trim a free-text field and cap it at the column width. Empty after
/// trimming means "not provided".
#[must_use]
pub fn clean_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_TEXT_CHARS).collect())
}

/// Parse a list field from whatever shape the client sent.
///
/// Accepted shapes, in order: absent or null (empty list), a JSON array
/// of scalars, a string containing a JSON array, a comma-separated
/// string. Numbers are stringified; booleans and objects are rejected.
///
/// # Errors
/// `FieldError::UnsupportedShape` when the value or an array element is
/// neither a string nor a number.
pub fn parse_list_field(name: &str, value: Option<&Value>) -> Result<Vec<String>, FieldError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => collect_items(name, items),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Vec::new());
            }
            if trimmed.starts_with('[') {
                // A stringified JSON array; fall back to comma-splitting
                // when it does not actually parse.
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                    return collect_items(name, &items);
                }
            }
            Ok(split_csv(trimmed))
        }
        _ => Err(FieldError::UnsupportedShape(name.to_string())),
    }
}

fn collect_items(name: &str, items: &[Value]) -> Result<Vec<String>, FieldError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let text = match item {
            Value::String(s) => s.trim().chars().take(MAX_TEXT_CHARS).collect::<String>(),
            Value::Number(n) => n.to_string(),
            _ => return Err(FieldError::UnsupportedShape(name.to_string())),
        };
        if !text.is_empty() {
            out.push(text);
        }
    }
    Ok(out)
}

fn split_csv(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.chars().take(MAX_TEXT_CHARS).collect())
        .collect()
}

/// Canonical display label for a site: anything not already starting
/// with "amazon" (any case) gets the "Amazon " prefix.
#[must_use]
pub fn canonical_site_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.to_lowercase().starts_with("amazon") {
        trimmed.to_string()
    } else {
        format!("Amazon {trimmed}")
    }
}

/// Short site identifier: the last whitespace-separated token of the
/// label, upper-cased so "amazon yyc1" and "Amazon YYC1" name the same
/// site row.
#[must_use]
pub fn site_slug(label: &str) -> String {
    label
        .split_whitespace()
        .next_back()
        .map(str::to_uppercase)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_text_trims_and_caps() {
        assert_eq!(clean_text("  Jane  "), Some("Jane".to_string()));
        assert_eq!(clean_text("   "), None);
        assert_eq!(clean_text(""), None);

        let long = "x".repeat(300);
        let cleaned = clean_text(&long).unwrap();
        assert_eq!(cleaned.chars().count(), 255);
    }

    #[test]
    fn clean_text_caps_by_chars_not_bytes() {
        let long = "é".repeat(300);
        let cleaned = clean_text(&long).unwrap();
        assert_eq!(cleaned.chars().count(), 255);
    }

    #[test]
    fn list_absent_or_null_is_empty() {
        assert_eq!(parse_list_field("sites", None).unwrap(), Vec::<String>::new());
        assert_eq!(
            parse_list_field("sites", Some(&Value::Null)).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn list_from_json_array() {
        let value = json!(["Amazon YYC1", " Amazon YEG2 ", ""]);
        assert_eq!(
            parse_list_field("sites", Some(&value)).unwrap(),
            vec!["Amazon YYC1", "Amazon YEG2"]
        );
    }

    #[test]
    fn list_numbers_are_stringified() {
        let value = json!([123, "abc"]);
        assert_eq!(
            parse_list_field("sites", Some(&value)).unwrap(),
            vec!["123", "abc"]
        );
    }

    #[test]
    fn list_from_stringified_json_array() {
        let value = json!("[\"Amazon YYC1\", \"Amazon YEG2\"]");
        assert_eq!(
            parse_list_field("sites", Some(&value)).unwrap(),
            vec!["Amazon YYC1", "Amazon YEG2"]
        );
    }

    #[test]
    fn list_from_comma_separated_string() {
        let value = json!("Amazon YYC1, Amazon YEG2 , ,");
        assert_eq!(
            parse_list_field("sites", Some(&value)).unwrap(),
            vec!["Amazon YYC1", "Amazon YEG2"]
        );
    }

    #[test]
    fn list_bracket_string_that_is_not_json_falls_back_to_csv() {
        let value = json!("[Amazon YYC1, Amazon YEG2]");
        assert_eq!(
            parse_list_field("sites", Some(&value)).unwrap(),
            vec!["[Amazon YYC1", "Amazon YEG2]"]
        );
    }

    #[test]
    fn list_rejects_other_shapes() {
        assert_eq!(
            parse_list_field("sites", Some(&json!(true))),
            Err(FieldError::UnsupportedShape("sites".to_string()))
        );
        assert_eq!(
            parse_list_field("sites", Some(&json!([{"a": 1}]))),
            Err(FieldError::UnsupportedShape("sites".to_string()))
        );
    }

    #[test]
    fn site_label_prefixes_when_missing() {
        assert_eq!(canonical_site_label("YYC1"), "Amazon YYC1");
        assert_eq!(canonical_site_label("Amazon YYC1"), "Amazon YYC1");
        assert_eq!(canonical_site_label("amazon yeg2"), "amazon yeg2");
        assert_eq!(canonical_site_label("  YVR2  "), "Amazon YVR2");
    }

    #[test]
    fn site_slug_is_last_token_uppercased() {
        assert_eq!(site_slug("Amazon YYC1"), "YYC1");
        assert_eq!(site_slug("YYC1"), "YYC1");
        assert_eq!(site_slug(""), "");
        // Both setup and default-site updates derive the slug from here,
        // so case differences must collapse to one row.
        assert_eq!(site_slug("amazon yyc1"), "YYC1");
        assert_eq!(site_slug("yyc1"), "YYC1");
    }
}
