//! Per-article summarization and business-opportunity scoring.
//!
//! [`Scorer::score`] is a pure function of `(subject, content)` plus whatever
//! the oracle answers:
//!
//! - no oracle configured: heuristic summary, score 0, [`ORACLE_UNAVAILABLE`];
//! - oracle call fails: same as above, no retry;
//! - oracle answers: the response is parsed through [`crate::repair`]; if it
//!   cannot be recovered the heuristic summary is used with score 0 and
//!   [`ORACLE_INVALID_OUTPUT`].
//!
//! The prompt is built deterministically from the subject, the target
//! company, the fixed [`RUBRIC`] and the article text, and the oracle is
//! always called with temperature 0.

use crate::models::Verdict;
use crate::oracle::Oracle;
use crate::repair::{ParseOutcome, parse_response};
use crate::utils::{looks_truncated, truncate_chars, truncate_for_log};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use tracing::{debug, error, info, instrument, warn};

/// Rationale used when no oracle is configured or the call failed.
pub const ORACLE_UNAVAILABLE: &str = "LLM unavailable.";

/// Rationale used when the oracle answered with unrecoverable output.
pub const ORACLE_INVALID_OUTPUT: &str = "LLM unavailable (invalid JSON).";

/// Heuristic summary for an article without any text.
pub const NO_CONTENT_SUMMARY: &str = "No content available.";

/// Upper bound on every summary, heuristic or oracle-produced.
pub const MAX_SUMMARY_CHARS: usize = 500;

const HEURISTIC_SENTENCES: usize = 3;

/// One additive category of the scoring rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubricItem {
    pub signal: &'static str,
    pub points: u8,
}

/// The fixed rubric. Points add up to exactly 100.
pub const RUBRIC: &[RubricItem] = &[
    RubricItem {
        signal: "The article is primarily about {subject} (not a passing mention)",
        points: 20,
    },
    RubricItem {
        signal: "Funding round, acquisition, merger, IPO or other major capital event",
        points: 15,
    },
    RubricItem {
        signal: "Product launch, platform migration or major technology change",
        points: 15,
    },
    RubricItem {
        signal: "Customer experience, digital transformation or modernization initiative",
        points: 15,
    },
    RubricItem {
        signal: "New executive or leadership change (CEO, CTO, CIO, CDO, head of product)",
        points: 10,
    },
    RubricItem {
        signal: "Expansion into new markets, regions or rapid hiring growth",
        points: 10,
    },
    RubricItem {
        signal: "Regulatory, compliance, security or data-privacy pressure",
        points: 10,
    },
    RubricItem {
        signal: "New partnership, vendor selection or outsourcing announcement",
        points: 5,
    },
];

/// Scores articles, optionally through an oracle.
///
/// Holds no state besides its borrowed collaborators; one instance serves a
/// whole run.
#[derive(Clone, Copy)]
pub struct Scorer<'a> {
    oracle: Option<&'a dyn Oracle>,
    target_company: &'a str,
}

impl<'a> Scorer<'a> {
    pub fn new(oracle: Option<&'a dyn Oracle>, target_company: &'a str) -> Self {
        Self {
            oracle,
            target_company,
        }
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Summarize and score `content`, an article about `subject`.
    #[instrument(level = "info", skip_all, fields(subject = %subject, content_chars = content.chars().count()))]
    pub async fn score(&self, subject: &str, content: &str) -> Verdict {
        let Some(oracle) = self.oracle else {
            debug!("No oracle configured; using heuristic summary");
            return heuristic_verdict(content, ORACLE_UNAVAILABLE);
        };

        let prompt = build_prompt(subject, self.target_company, content);
        let raw = match oracle.call(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Oracle call failed; using heuristic summary");
                return heuristic_verdict(content, ORACLE_UNAVAILABLE);
            }
        };

        match parse_response(&raw) {
            ParseOutcome::Parsed { object, path } => {
                info!(parse_path = path.as_str(), "Parsed oracle response");
                verdict_from_object(&object)
            }
            ParseOutcome::Unrecoverable { error } => {
                warn!(
                    error = %error,
                    truncated = looks_truncated(&error),
                    response = %truncate_for_log(&raw, 1000),
                    "Oracle returned invalid JSON even after repair; using heuristic summary"
                );
                heuristic_verdict(content, ORACLE_INVALID_OUTPUT)
            }
        }
    }
}

/// The full prompt sent to the oracle for one article.
pub fn build_prompt(subject: &str, target_company: &str, content: &str) -> String {
    let subject = subject.trim();
    let mut prompt = String::with_capacity(content.len() + 2048);

    if subject.is_empty() {
        let _ = writeln!(
            prompt,
            "We are evaluating a news article about a company and the business opportunity it may represent for '{target_company}'."
        );
        prompt.push_str("Summarize the article in 120 words or less.\n\n");
    } else {
        let _ = writeln!(
            prompt,
            "We are evaluating a news article about '{subject}' and the business opportunity it may represent for '{target_company}'."
        );
        let _ = writeln!(
            prompt,
            "Summarize the article in 120 words or less, showing how it is relevant to '{subject}'."
        );
        let _ = writeln!(
            prompt,
            "If the article is not about or relevant to '{subject}', say so.\n"
        );
    }

    prompt.push_str("Use the rubric below to assign a deterministic, additive score from 0 to 100.\n");
    prompt.push_str("Only award points for signals clearly stated in the article; the total never exceeds 100.\n\n");

    let _ = writeln!(prompt, "In your summary:");
    let _ = writeln!(prompt, "- Only summarize the article; do not add commentary.");
    let _ = writeln!(prompt, "- Do not mention {target_company}.\n");

    let _ = writeln!(prompt, "In your rationale:");
    let _ = writeln!(
        prompt,
        "- Explain how {target_company} could help the teams or companies involved, naming one concrete capability."
    );
    let _ = writeln!(prompt, "- Do not reference rubric items or point values.\n");

    prompt.push_str("Respond with a single valid JSON object with exactly these keys and nothing else:\n");
    prompt.push_str("- \"summary\": string, at most 120 words\n");
    prompt.push_str("- \"score\": integer from 0 to 100\n");
    prompt.push_str("- \"rationale\": string, one sentence of at most 20 words explaining the score\n\n");

    prompt.push_str("Rubric:\n");
    let rubric_subject = if subject.is_empty() { "the company" } else { subject };
    for item in RUBRIC {
        let _ = writeln!(
            prompt,
            "- {}: +{} points",
            item.signal.replace("{subject}", rubric_subject),
            item.points
        );
    }

    prompt.push_str("\nArticle:\n");
    prompt.push_str(content);
    prompt.push('\n');
    prompt
}

/// The deterministic fallback: first three sentences, capped at
/// [`MAX_SUMMARY_CHARS`] characters.
pub fn heuristic_summary(content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        return NO_CONTENT_SUMMARY.to_string();
    }
    let joined = sentences(content)
        .into_iter()
        .take(HEURISTIC_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ");
    truncate_chars(&joined, MAX_SUMMARY_CHARS)
}

pub fn heuristic_verdict(content: &str, rationale: &str) -> Verdict {
    Verdict {
        summary: heuristic_summary(content),
        score: 0,
        rationale: rationale.to_string(),
    }
}

/// Split on `.`, `!` or `?` followed by whitespace or the end of the text.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let next = chars.peek().map(|(_, n)| *n);
        if next.is_none_or(char::is_whitespace) {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn verdict_from_object(object: &Map<String, Value>) -> Verdict {
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string()
    };
    let summary = text("summary");
    if summary.chars().count() > MAX_SUMMARY_CHARS {
        debug!(chars = summary.chars().count(), "Capping oversized oracle summary");
    }
    Verdict {
        summary: truncate_chars(&summary, MAX_SUMMARY_CHARS),
        score: coerce_score(object.get("score")),
        rationale: text("rationale"),
    }
}

/// Integer score in 0..=100 from a JSON number or numeric string; anything
/// else is 0.
fn coerce_score(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    };
    raw.unwrap_or(0).clamp(0, 100) as u8
}
