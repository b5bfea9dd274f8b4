//! Turns whatever JSON the workflow answers with into one markdown string.
//!
//! Workflows built in the engine answer with many shapes: a bare string, an
//! object carrying `output`, `text` or `response`, or an arbitrary object or
//! list of items.
//! The extractors below are tried in order; the first one that yields text
//! wins. The text is then escaped and, when it carries no code fences at
//! all, indented lines are fenced so they render as code.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

const CODE_FENCE: &str = "```";

/// One way of pulling candidate text out of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// The payload itself is a string
    Verbatim,
    /// A named field of an object payload holding a non-empty string
    Field(&'static str),
    /// Pretty-printed JSON of a non-empty object or array payload
    PrettyJson,
}

/// Extraction priority, first match wins
pub const EXTRACTORS: &[Extractor] = &[
    Extractor::Verbatim,
    Extractor::Field("output"),
    Extractor::Field("text"),
    Extractor::Field("response"),
    Extractor::PrettyJson,
];

impl Extractor {
    pub fn extract(&self, payload: &Value) -> Option<String> {
        match (self, payload) {
            (Extractor::Verbatim, Value::String(text)) => Some(text.clone()),
            (Extractor::Field(name), Value::Object(map)) => match map.get(*name) {
                Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
                _ => None,
            },
            (Extractor::PrettyJson, Value::Object(map)) if !map.is_empty() => {
                serde_json::to_string_pretty(payload).ok()
            }
            (Extractor::PrettyJson, Value::Array(items)) if !items.is_empty() => {
                serde_json::to_string_pretty(payload).ok()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no displayable content in payload of shape {shape}")]
    NoCandidate { shape: String },

    #[error("payload of shape {shape} produced empty content")]
    Empty { shape: String },
}

impl ExtractionError {
    pub fn shape(&self) -> &str {
        match self {
            ExtractionError::NoCandidate { shape } | ExtractionError::Empty { shape } => shape,
        }
    }
}

/// Run the extractors in order against the payload.
pub fn extract_candidate(payload: &Value) -> Option<String> {
    EXTRACTORS.iter().find_map(|extractor| extractor.extract(payload))
}

/// Normalize an upstream payload into renderable markdown.
///
/// The payload is consumed; only the extracted text survives.
pub fn normalize_response(payload: Value) -> Result<String, ExtractionError> {
    let candidate = match payload {
        // Avoid cloning the common bare-string case
        Value::String(text) => text,
        other => extract_candidate(&other).ok_or_else(|| ExtractionError::NoCandidate {
            shape: payload_shape(&other),
        })?,
    };

    if candidate.is_empty() {
        return Err(ExtractionError::Empty {
            shape: payload_shape(&Value::String(candidate)),
        });
    }

    let escaped = escape_html(&candidate);
    Ok(repair_code_fences(&escaped))
}

/// Replace every `<` and `>` with its HTML entity. Nothing else is touched.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn indented_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // CRLF mode: `$` also stops before "\r\n" and the `\r` stays out of the fence
        Regex::new(r"(?mR)^( {4,}|\t+)([^\r\n]+)$").expect("indented line pattern is valid")
    })
}

/// Fence indented lines when the text has no code fences at all.
///
/// Each line indented by four or more spaces or by tabs becomes its own
/// fenced block. Text that already contains a fence is returned unchanged.
pub fn repair_code_fences(text: &str) -> String {
    if text.contains(CODE_FENCE) || !indented_line().is_match(text) {
        return text.to_string();
    }

    indented_line()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("\n{fence}\n{}\n{fence}\n", caps[0].trim_start(), fence = CODE_FENCE)
        })
        .into_owned()
}

/// Short description of a payload's shape, for diagnostics.
pub fn payload_shape(payload: &Value) -> String {
    match payload {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(s) => format!("string({} chars)", s.chars().count()),
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("object{{{}}}", keys.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_field() {
        assert_eq!(normalize_response(json!({"output": "hello"})).unwrap(), "hello");
    }

    #[test]
    fn test_bare_string() {
        assert_eq!(normalize_response(json!("hello")).unwrap(), "hello");
    }

    #[test]
    fn test_response_field() {
        assert_eq!(normalize_response(json!({"response": "world"})).unwrap(), "world");
    }

    #[test]
    fn test_field_priority() {
        let payload = json!({"response": "third", "text": "second", "output": "first"});
        assert_eq!(normalize_response(payload).unwrap(), "first");

        let payload = json!({"response": "third", "text": "second"});
        assert_eq!(normalize_response(payload).unwrap(), "second");
    }

    #[test]
    fn test_non_string_field_is_skipped() {
        let payload = json!({"output": {"nested": true}, "text": "fallback"});
        assert_eq!(normalize_response(payload).unwrap(), "fallback");
    }

    #[test]
    fn test_empty_string_field_is_skipped() {
        let payload = json!({"output": "", "response": "used"});
        assert_eq!(normalize_response(payload).unwrap(), "used");
    }

    #[test]
    fn test_unknown_object_is_pretty_printed() {
        let payload = json!({"status": "ok"});
        let text = normalize_response(payload).unwrap();
        assert_eq!(text, "{\n  \"status\": \"ok\"\n}");
    }

    #[test]
    fn test_empty_object_fails() {
        let err = normalize_response(json!({})).unwrap_err();
        assert_eq!(err, ExtractionError::NoCandidate { shape: "object{}".to_string() });
    }

    #[test]
    fn test_unsupported_types_fail() {
        assert!(normalize_response(Value::Null).is_err());
        assert!(normalize_response(json!(42)).is_err());
        let err = normalize_response(json!("")).unwrap_err();
        assert!(matches!(err, ExtractionError::Empty { .. }));
        assert_eq!(err.shape(), "string(0 chars)");
    }

    #[test]
    fn test_item_list_is_pretty_printed() {
        let text = normalize_response(json!(["first", "second"])).unwrap();
        assert_eq!(text, "[\n  \"first\",\n  \"second\"\n]");
    }

    #[test]
    fn test_empty_array_fails() {
        let err = normalize_response(json!([])).unwrap_err();
        assert_eq!(err, ExtractionError::NoCandidate { shape: "array[0]".to_string() });
    }

    #[test]
    fn test_crlf_indented_line_is_fenced_without_carriage_return() {
        let text = repair_code_fences("Try this:\r\n    const x = 1;\r\nDone");
        assert_eq!(text, "Try this:\r\n\n```\nconst x = 1;\n```\n\r\nDone");
    }

    #[test]
    fn test_html_is_escaped_once() {
        let text = normalize_response(json!({"output": "<b>hi</b>"})).unwrap();
        assert_eq!(text, "&lt;b&gt;hi&lt;/b&gt;");
    }

    #[test]
    fn test_escape_leaves_ampersands() {
        assert_eq!(escape_html("a & b > c"), "a & b &gt; c");
    }

    #[test]
    fn test_indented_line_is_fenced() {
        let text = normalize_response(json!({"output": "Try this:\n    const x = 1;"})).unwrap();
        assert_eq!(text, "Try this:\n\n```\nconst x = 1;\n```\n");
    }

    #[test]
    fn test_tab_indented_line_is_fenced() {
        assert_eq!(repair_code_fences("\tlet y = 2;"), "\n```\nlet y = 2;\n```\n");
    }

    #[test]
    fn test_existing_fence_is_untouched() {
        let input = "```\ncode\n```\n    indented";
        assert_eq!(repair_code_fences(input), input);
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert_eq!(repair_code_fences("# OK\nAll good"), "# OK\nAll good");
    }

    #[test]
    fn test_extractor_order_is_explicit() {
        assert_eq!(EXTRACTORS.first(), Some(&Extractor::Verbatim));
        assert_eq!(EXTRACTORS.last(), Some(&Extractor::PrettyJson));
        assert_eq!(Extractor::Field("text").extract(&json!({"text": "t"})), Some("t".to_string()));
        assert_eq!(Extractor::PrettyJson.extract(&json!("s")), None);
    }

    #[test]
    fn test_payload_shape() {
        assert_eq!(payload_shape(&json!(null)), "null");
        assert_eq!(payload_shape(&json!([1, 2, 3])), "array[3]");
        assert_eq!(payload_shape(&json!({"a": 1, "b": 2})), "object{a,b}");
    }
}
