/*!
 * Staged recovery of backend batch responses.
 *
 * Models answer with a JSON array of `{source, translation}` objects, but
 * the raw payload may arrive wrapped in prose or code fences, truncated
 * mid-object, or with fields reordered. Recovery runs in stages and reports
 * which stage produced the items; when every stage fails the batch yields
 * zero results. Nothing is ever fabricated.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// One backend output entry.
///
/// The echoed source and index are untrusted hints for the reconciler,
/// never ground truth for identity.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResponseItem {
    /// Echoed source text, if the model returned one
    #[serde(default)]
    pub source: Option<String>,

    /// The translated text
    pub translation: String,

    /// Echoed input index, if the model returned one
    #[serde(default)]
    pub index: Option<usize>,
}

/// Which stage of recovery produced the items
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The payload parsed as-is
    Strict(Vec<ResponseItem>),
    /// The payload parsed after minimal syntactic repair
    Repaired(Vec<ResponseItem>),
    /// Items were pattern-extracted from an unparseable payload
    PatternExtracted(Vec<ResponseItem>),
    /// All stages failed; the batch yields zero results
    Failed(String),
}

impl ParseOutcome {
    /// The recovered items, empty when recovery failed
    pub fn items(&self) -> &[ResponseItem] {
        match self {
            ParseOutcome::Strict(items)
            | ParseOutcome::Repaired(items)
            | ParseOutcome::PatternExtracted(items) => items,
            ParseOutcome::Failed(_) => &[],
        }
    }

    /// Consume the outcome, yielding its items
    pub fn into_items(self) -> Vec<ResponseItem> {
        match self {
            ParseOutcome::Strict(items)
            | ParseOutcome::Repaired(items)
            | ParseOutcome::PatternExtracted(items) => items,
            ParseOutcome::Failed(_) => Vec::new(),
        }
    }

    /// Short stage label for logging
    pub fn stage(&self) -> &'static str {
        match self {
            ParseOutcome::Strict(_) => "strict",
            ParseOutcome::Repaired(_) => "repaired",
            ParseOutcome::PatternExtracted(_) => "pattern",
            ParseOutcome::Failed(_) => "failed",
        }
    }

    /// Whether recovery failed entirely
    pub fn is_failed(&self) -> bool {
        matches!(self, ParseOutcome::Failed(_))
    }
}

/// Run the staged recovery over a raw model payload
pub fn recover_items(raw: &str) -> ParseOutcome {
    // Stage 1: strict parse
    if let Ok(items) = serde_json::from_str::<Vec<ResponseItem>>(raw.trim()) {
        return ParseOutcome::Strict(items);
    }

    // Stage 2: minimal syntactic repair
    if let Some(items) = repair_and_parse(raw) {
        return ParseOutcome::Repaired(items);
    }

    // Stage 3: pattern-based extraction
    let extracted = extract_pairs(raw);
    if !extracted.is_empty() {
        return ParseOutcome::PatternExtracted(extracted);
    }

    let head: String = raw.chars().take(120).collect();
    ParseOutcome::Failed(format!("Unrecoverable payload: {}", head))
}

/// Stage 2: strip decoration, close truncation, drop trailing commas
fn repair_and_parse(raw: &str) -> Option<Vec<ResponseItem>> {
    let mut candidate = strip_decoration(raw)?;

    if let Ok(items) = serde_json::from_str::<Vec<ResponseItem>>(&candidate) {
        return Some(items);
    }

    // Drop trailing commas before closing brackets
    candidate = TRAILING_COMMA.replace_all(&candidate, "$1").into_owned();
    if let Ok(items) = serde_json::from_str::<Vec<ResponseItem>>(&candidate) {
        return Some(items);
    }

    // Truncated mid-object: cut back to the last complete object and close
    // the array. Only complete objects survive; the torn one is dropped.
    if let Some(pos) = candidate.rfind('}') {
        let mut cut = candidate[..=pos].to_string();
        cut.push(']');
        if let Ok(items) = serde_json::from_str::<Vec<ResponseItem>>(&cut) {
            return Some(items);
        }
    }

    None
}

/// Pull the JSON array out of surrounding prose or markdown fences
fn strip_decoration(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    // Prefer fenced content when present
    let inner = if let Some(captures) = CODE_FENCE.captures(trimmed) {
        captures.get(1).map(|m| m.as_str()).unwrap_or(trimmed)
    } else {
        trimmed
    };

    let start = inner.find('[')?;
    let end = inner.rfind(']');
    match end {
        Some(end) if end > start => Some(inner[start..=end].to_string()),
        // No closing bracket at all: keep from the opening bracket on and
        // let the truncation repair deal with it
        _ => Some(inner[start..].to_string()),
    }
}

/// Stage 3: regex extraction of source/translation pairs.
///
/// Scans brace-delimited spans and accepts each one carrying both fields,
/// in either order. Spans missing either field are skipped.
fn extract_pairs(raw: &str) -> Vec<ResponseItem> {
    let mut items = Vec::new();

    for object in OBJECT_SPAN.find_iter(raw) {
        let span = object.as_str();
        let source = FIELD_SOURCE
            .captures(span)
            .and_then(|c| c.get(1))
            .map(|m| decode_json_string(m.as_str()));
        let translation = FIELD_TRANSLATION
            .captures(span)
            .and_then(|c| c.get(1))
            .map(|m| decode_json_string(m.as_str()));

        if let (Some(source), Some(translation)) = (source, translation) {
            items.push(ResponseItem {
                source: Some(source),
                translation,
                index: None,
            });
        }
    }

    items
}

/// Decode the escape sequences of a JSON string body
fn decode_json_string(body: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", body)).unwrap_or_else(|_| body.to_string())
}

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex")
});

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s*([\]}])").expect("valid regex")
});

static OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*\}").expect("valid regex")
});

static FIELD_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""source"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

static FIELD_TRANSLATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""translation"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});
