//! Works out which company a run is about.
//!
//! A plain search term is used as-is. A website URL is turned into a brand
//! name from the page's metadata: by the oracle when one is configured and
//! confident enough, otherwise by a fixed heuristic over the same metadata.

use crate::oracle::Oracle;
use crate::repair::parse_response;
use crate::sources::HtmlFetcher;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use url::Url;

/// Oracle answers below this confidence are replaced by the heuristic.
pub const MIN_CONFIDENCE: f64 = 0.3;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).expect("static selector"));
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("static selector"));
static OG_SITE_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:site_name"]"#).expect("static selector"));
static APPLICATION_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="application-name"]"#).expect("static selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));

/// How the subject name was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    SearchTerm,
    Oracle,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub name: String,
    pub confidence: f64,
    pub explanation: String,
    pub method: Method,
}

/// True for absolute `http`/`https` URLs with a host.
pub fn is_valid_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Branding hints collected from a company web page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_site_name: Option<String>,
    pub h1: Option<String>,
    #[serde(skip)]
    pub application_name: Option<String>,
    /// Host without a leading `www.`.
    pub domain: String,
}

impl PageMetadata {
    /// Metadata with only the domain known, for pages that could not be
    /// fetched.
    pub fn for_url(url: &str) -> Self {
        Self {
            domain: domain_of(url),
            ..Self::default()
        }
    }

    pub fn from_html(url: &str, html: &str) -> Self {
        let doc = Html::parse_document(html);
        let text_of = |selector: &Selector| {
            doc.select(selector)
                .next()
                .map(|el| el.text().collect::<String>())
                .and_then(non_blank)
        };
        let content_of = |selector: &Selector| {
            doc.select(selector)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(str::to_string)
                .and_then(non_blank)
        };
        Self {
            title: text_of(&TITLE),
            meta_description: content_of(&DESCRIPTION),
            og_title: content_of(&OG_TITLE),
            og_site_name: content_of(&OG_SITE_NAME),
            h1: text_of(&H1),
            application_name: content_of(&APPLICATION_NAME),
            domain: domain_of(url),
        }
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_default()
}

/// `og:site_name`, then `<title>`, then `application-name`, then a name
/// derived from the domain.
pub fn heuristic_name(meta: &PageMetadata) -> String {
    [&meta.og_site_name, &meta.title, &meta.application_name]
        .into_iter()
        .flatten()
        .next()
        .cloned()
        .unwrap_or_else(|| name_from_domain(&meta.domain))
}

/// `foobar-inc.org` becomes `Foobar Inc`.
pub fn name_from_domain(domain: &str) -> String {
    let label = domain.split('.').next().unwrap_or_default();
    label
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn build_prompt(meta: &PageMetadata) -> String {
    let metadata = serde_json::to_string(meta).unwrap_or_default();
    format!(
        "You are identifying the correct brand name associated with the following website. \
This should be the name most prominently used by the public and in branding, including headlines and user interfaces. \
Do NOT default to the parent company unless the brand name is unclear or not independently recognized. \
Avoid legal suffixes like 'Inc.' or 'LLC' unless part of the public-facing brand.\n\
Respond in JSON format:\n\
- 'inferred_name': a string\n\
- 'confidence': a float from 0.0 to 1.0\n\
- 'explanation': a brief rationale (1-2 sentences)\n\
Only include the requested keys in your response. Do not add any extra text or commentary.\n\
METADATA: {metadata}"
    )
}

fn parse_inference(object: &Map<String, Value>) -> Option<(String, f64, String)> {
    let name = object
        .get("inferred_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())?
        .to_string();
    let confidence = match object.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((name, confidence, explanation))
}

fn heuristic(meta: &PageMetadata, explanation: &str) -> Subject {
    Subject {
        name: heuristic_name(meta),
        confidence: 0.0,
        explanation: explanation.to_string(),
        method: Method::Heuristic,
    }
}

/// Resolve `query` to the company name used for searching, prompting and
/// file naming.
#[instrument(level = "info", skip_all, fields(%query))]
pub async fn resolve_subject(
    query: &str,
    fetcher: &dyn HtmlFetcher,
    oracle: Option<&dyn Oracle>,
) -> Subject {
    let query = query.trim();
    if !is_valid_url(query) {
        info!("Treating input as a search term");
        return Subject {
            name: query.to_string(),
            confidence: 1.0,
            explanation: "Input used as search term.".to_string(),
            method: Method::SearchTerm,
        };
    }

    let meta = match fetcher.fetch_html(query).await {
        Ok(html) => PageMetadata::from_html(query, &html),
        Err(e) => {
            warn!(error = %e, "Could not fetch company page; using domain only");
            PageMetadata::for_url(query)
        }
    };
    info!(?meta, "Collected page metadata");

    let Some(oracle) = oracle else {
        return heuristic(&meta, "Heuristic extractor; no LLM configured.");
    };

    let raw = match oracle.call(&build_prompt(&meta)).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Brand name inference failed");
            return heuristic(&meta, "Fallback to heuristic extractor due to LLM failure.");
        }
    };
    info!(response = %truncate_for_log(&raw, 500), "Brand name oracle response");

    match parse_response(&raw).into_object().as_ref().and_then(parse_inference) {
        Some((name, confidence, explanation)) if confidence >= MIN_CONFIDENCE => {
            info!(%name, confidence, "Inferred brand name");
            Subject {
                name,
                confidence,
                explanation,
                method: Method::Oracle,
            }
        }
        Some((name, confidence, _)) => {
            info!(%name, confidence, "Low-confidence brand name; using heuristic");
            heuristic(&meta, "Fallback to heuristic extractor due to low LLM confidence.")
        }
        None => {
            info!("Unusable brand name response; using heuristic");
            heuristic(&meta, "Fallback to heuristic extractor due to LLM failure.")
        }
    }
}
