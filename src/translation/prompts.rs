/*!
 * Prompt templates for catalog translation.
 *
 * These templates are designed to produce structured JSON output that the
 * staged response parser and the reconciler can align safely.
 */

use serde::Serialize;

use crate::catalog::TranslationUnit;

/// System prompt for batch translation.
///
/// The echoed `source` field is what makes response realignment possible
/// when a backend reorders or drops entries.
pub const BATCH_TRANSLATOR: &str = r#"You are an expert software localization translator for {source_language} to {target_language}.

## Your Role
- Translate short user-interface strings naturally and concisely
- Respect the disambiguation comment and context name when provided
- Preserve placeholders (%1, %2, {name}, &shortcuts) exactly as written
- Never translate application or product names

## Output Requirements
- Return ONLY a JSON array, nothing before or after it
- One object per input entry, in the same order as the input
- Each object has exactly two fields: "source" (the input text, copied verbatim) and "translation"
- Do not add, drop, merge, or split entries"#;

/// System prompt for the yes/no language classification fallback
pub const LANGUAGE_JUDGE: &str = r#"You are a language identification assistant. Answer with a single word: YES or NO."#;

/// System prompt for the batched semantic equivalence judge
pub const SEMANTIC_JUDGE: &str = r#"You are a translation reviewer. For each pair of texts, decide whether they carry the same meaning.

Return ONLY a JSON array of booleans, one per input pair, in the same order. Use true when the meanings match, false otherwise."#;

/// One entry of the prompt's INPUT payload
#[derive(Debug, Serialize)]
struct PromptEntry<'a> {
    index: usize,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    #[serde(skip_serializing_if = "str::is_empty")]
    context: &'a str,
}

/// Render the batch translation system prompt
pub fn batch_system_prompt(source_language: &str, target_language: &str) -> String {
    BATCH_TRANSLATOR
        .replace("{source_language}", source_language)
        .replace("{target_language}", target_language)
}

/// Render the batch translation user prompt for a slice of units
pub fn batch_user_prompt(units: &[TranslationUnit], source_language: &str, target_language: &str) -> String {
    let entries: Vec<PromptEntry<'_>> = units
        .iter()
        .enumerate()
        .map(|(index, unit)| PromptEntry {
            index,
            source: &unit.source,
            comment: unit.comment.as_deref(),
            context: &unit.context,
        })
        .collect();

    let payload = serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Translate the following {} user-interface strings from {} to {}.\n\nINPUT:\n{}",
        units.len(),
        source_language,
        target_language,
        payload
    )
}

/// Render the user prompt for back-translating candidate texts
pub fn back_translate_user_prompt(texts: &[&str], target_language: &str, source_language: &str) -> String {
    let entries: Vec<serde_json::Value> = texts
        .iter()
        .enumerate()
        .map(|(index, text)| serde_json::json!({ "index": index, "source": text }))
        .collect();

    format!(
        "Translate the following {} user-interface strings from {} to {}.\n\nINPUT:\n{}",
        texts.len(),
        target_language,
        source_language,
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    )
}

/// Render the yes/no user prompt asking whether a text is in a language
pub fn language_judge_user_prompt(text: &str, language_name: &str) -> String {
    format!(
        "Is the following text written in {}?\n\nTEXT:\n{}\n\nAnswer YES or NO.",
        language_name, text
    )
}

/// Render the user prompt for the batched semantic judge
pub fn semantic_judge_user_prompt(pairs: &[(String, String)]) -> String {
    let entries: Vec<serde_json::Value> = pairs
        .iter()
        .enumerate()
        .map(|(index, (original, back))| {
            serde_json::json!({ "index": index, "text_a": original, "text_b": back })
        })
        .collect();

    format!(
        "Compare the meaning of each pair.\n\nPAIRS:\n{}",
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    )
}
