//! Tolerant parsing of oracle responses that are supposed to be a JSON object.
//!
//! The raw text is first parsed as-is (after stripping a surrounding Markdown
//! code fence). If that fails, two repairs are tried in order, each only if
//! the previous one failed:
//!
//! 1. **Bracket completion**: a response that does not end with `}` gets one
//!    appended (output truncated at the token limit).
//! 2. **Inner-quote escaping**: unescaped `"` inside the string values of
//!    `summary`, `rationale` and `title` are escaped. Applied on top of the
//!    bracket-completed text.
//!
//! Parse errors never escape this module; callers get a [`ParseOutcome`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Keys whose string values may carry unescaped quotes from natural language.
pub const FREE_TEXT_KEYS: [&str; 3] = ["summary", "rationale", "title"];

static FREE_TEXT_OPENER: Lazy<Regex> = Lazy::new(|| {
    let keys = FREE_TEXT_KEYS.join("|");
    Regex::new(&format!(r#""({keys})"\s*:\s*""#)).expect("static regex")
});

/// How a response was turned into an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePath {
    Direct,
    BracketCompleted,
    QuotesEscaped,
}

impl ParsePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParsePath::Direct => "direct",
            ParsePath::BracketCompleted => "bracket_completed",
            ParsePath::QuotesEscaped => "quotes_escaped",
        }
    }
}

#[derive(Debug)]
pub enum ParseOutcome {
    Parsed {
        object: Map<String, Value>,
        path: ParsePath,
    },
    /// Every attempt failed; `error` is the last parse error.
    Unrecoverable { error: serde_json::Error },
}

impl ParseOutcome {
    pub fn into_object(self) -> Option<Map<String, Value>> {
        match self {
            ParseOutcome::Parsed { object, .. } => Some(object),
            ParseOutcome::Unrecoverable { .. } => None,
        }
    }
}

/// Parse `raw` directly, falling back to [`repair`] on failure.
pub fn parse_response(raw: &str) -> ParseOutcome {
    let candidate = strip_code_fence(raw.trim());
    match parse_object(candidate) {
        Ok(object) => ParseOutcome::Parsed {
            object,
            path: ParsePath::Direct,
        },
        Err(_) => repair(candidate),
    }
}

/// Try the repair tiers on text that failed a direct parse.
pub fn repair(raw: &str) -> ParseOutcome {
    let trimmed = raw.trim();

    let completed = if trimmed.ends_with('}') {
        trimmed.to_string()
    } else {
        let completed = format!("{trimmed}}}");
        if let Ok(object) = parse_object(&completed) {
            return ParseOutcome::Parsed {
                object,
                path: ParsePath::BracketCompleted,
            };
        }
        completed
    };

    match parse_object(&escape_inner_quotes(&completed)) {
        Ok(object) => ParseOutcome::Parsed {
            object,
            path: ParsePath::QuotesEscaped,
        },
        Err(error) => ParseOutcome::Unrecoverable { error },
    }
}

fn parse_object(text: &str) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_str::<Map<String, Value>>(text)
}

/// Drop a surrounding ```` ```json ```` / ```` ``` ```` fence if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Escape unescaped double quotes inside the values of [`FREE_TEXT_KEYS`].
///
/// A value runs from its opening quote to the first unescaped quote that is
/// followed (after optional spaces) by `,`, `}`, a newline or the end of input.
fn escape_inner_quotes(json: &str) -> String {
    let mut out = String::with_capacity(json.len() + 16);
    let mut cursor = 0;

    while let Some(opener) = FREE_TEXT_OPENER.find_at(json, cursor) {
        let value_start = opener.end();
        out.push_str(&json[cursor..value_start]);
        match closing_quote(&json[value_start..]) {
            Some(offset) => {
                let value_end = value_start + offset;
                out.push_str(&escape_unescaped_quotes(&json[value_start..value_end]));
                out.push('"');
                cursor = value_end + 1;
            }
            None => {
                cursor = value_start;
                break;
            }
        }
    }
    out.push_str(&json[cursor..]);
    out
}

fn closing_quote(value: &str) -> Option<usize> {
    let bytes = value.as_bytes();
    for (idx, c) in value.char_indices() {
        if c != '"' || (idx > 0 && bytes[idx - 1] == b'\\') {
            continue;
        }
        let after = value[idx + 1..].trim_start_matches([' ', '\t', '\r']);
        if after.is_empty() || after.starts_with([',', '}', '\n']) {
            return Some(idx);
        }
    }
    None
}

fn escape_unescaped_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut previous = None;
    for c in value.chars() {
        if c == '"' && previous != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(outcome: ParseOutcome) -> (Value, ParsePath) {
        match outcome {
            ParseOutcome::Parsed { object, path } => (Value::Object(object), path),
            ParseOutcome::Unrecoverable { error } => panic!("unrecoverable: {error}"),
        }
    }

    #[test]
    fn test_valid_json_parses_directly() {
        let (value, path) = parsed(parse_response(r#"{"summary":"a","score":5,"rationale":"b"}"#));
        assert_eq!(path, ParsePath::Direct);
        assert_eq!(value, json!({"summary": "a", "score": 5, "rationale": "b"}));
    }

    #[test]
    fn test_missing_closing_brace_is_completed() {
        let (value, path) = parsed(repair(r#"{"summary":"a","score":5,"rationale":"b""#));
        assert_eq!(path, ParsePath::BracketCompleted);
        assert_eq!(value, json!({"summary": "a", "score": 5, "rationale": "b"}));
    }

    #[test]
    fn test_unescaped_inner_quotes_are_escaped() {
        let raw = r#"{"summary": "He said "hi" today", "score": 1, "rationale": "x"}"#;
        let (value, path) = parsed(parse_response(raw));
        assert_eq!(path, ParsePath::QuotesEscaped);
        assert_eq!(value["summary"], r#"He said "hi" today"#);
        assert_eq!(value["score"], 1);
        assert_eq!(value["rationale"], "x");
    }

    #[test]
    fn test_truncated_and_quoted_together() {
        let raw = "{\"summary\": \"Acme's \"big bet\" pays off\",\n\"score\": 40,\n\"rationale\": \"Growth \"signal\"\"";
        let (value, path) = parsed(parse_response(raw));
        assert_eq!(path, ParsePath::QuotesEscaped);
        assert_eq!(value["summary"], r#"Acme's "big bet" pays off"#);
        assert_eq!(value["rationale"], r#"Growth "signal""#);
        assert_eq!(value["score"], 40);
    }

    #[test]
    fn test_already_escaped_quotes_are_left_alone() {
        let raw = r#"{"title": "The \"Deal\"", "summary": "It "closed"", "score": 2, "rationale": "r"}"#;
        let (value, _) = parsed(parse_response(raw));
        assert_eq!(value["title"], r#"The "Deal""#);
        assert_eq!(value["summary"], r#"It "closed""#);
    }

    #[test]
    fn test_every_free_text_key_is_repaired() {
        for key in FREE_TEXT_KEYS {
            let raw = format!(r#"{{"{key}": "Acme "wins" big", "score": 3}}"#);
            let (value, path) = parsed(parse_response(&raw));
            assert_eq!(path, ParsePath::QuotesEscaped, "{key}");
            assert_eq!(value[key], r#"Acme "wins" big"#);
        }
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let raw = "```json\n{\"summary\": \"a\", \"score\": 9, \"rationale\": \"b\"}\n```";
        let (value, path) = parsed(parse_response(raw));
        assert_eq!(path, ParsePath::Direct);
        assert_eq!(value["score"], 9);
    }

    #[test]
    fn test_garbage_is_unrecoverable() {
        assert!(matches!(
            parse_response("{not: valid json]"),
            ParseOutcome::Unrecoverable { .. }
        ));
        assert!(parse_response("A concise summary about compliance.").into_object().is_none());
    }

    #[test]
    fn test_non_object_json_is_unrecoverable() {
        assert!(parse_response("[1, 2, 3]").into_object().is_none());
    }
}
