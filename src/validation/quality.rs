/*!
 * Heuristic quality validation.
 *
 * Cheap checks that catch degenerate model output before any network-based
 * validation runs: empty answers, punctuation-only answers, runaway
 * repetition, absurd length ratios, and untranslated echoes. Every
 * threshold comes from configuration.
 */

use crate::app_config::QualityConfig;

use super::Verdict;

/// Heuristic validator for candidate translations
#[derive(Debug, Clone)]
pub struct QualityValidator {
    config: QualityConfig,
}

impl QualityValidator {
    /// Create a validator with the given thresholds
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Run every heuristic against a candidate; the first hit rejects it
    pub fn validate(&self, source: &str, translation: &str) -> Verdict {
        let trimmed = translation.trim();
        if trimmed.is_empty() {
            return Verdict::fail("empty translation");
        }

        if trimmed.chars().all(|c| !c.is_alphanumeric()) {
            return Verdict::fail("translation is only punctuation or symbols");
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| (c.is_control() && !matches!(c, '\n' | '\r' | '\t')) || *c == '\u{FFFD}')
        {
            return Verdict::fail(format!("translation contains control character U+{:04X}", bad as u32));
        }

        let source_len = source.chars().count();
        let translation_len = trimmed.chars().count();

        if source_len > 0 && translation_len > source_len * self.config.max_length_ratio {
            return Verdict::fail(format!(
                "translation is {}x longer than the source (limit {}x)",
                translation_len / source_len.max(1),
                self.config.max_length_ratio
            ));
        }

        if let Some(c) = longest_repeat(trimmed, self.config.max_repeat_run) {
            return Verdict::fail(format!(
                "character '{}' repeats {} or more times",
                c, self.config.max_repeat_run
            ));
        }

        if translation_len > self.config.single_char_max_len && is_single_unique_char(trimmed) {
            return Verdict::fail("translation is one character repeated");
        }

        if source_len > self.config.long_source_len
            && translation_len <= self.config.short_translation_len
        {
            return Verdict::fail(format!(
                "suspiciously short translation ({} chars) for a {}-char source",
                translation_len, source_len
            ));
        }

        if source_len > self.config.identical_echo_min_len && trimmed == source.trim() {
            return Verdict::fail("translation is identical to the source");
        }

        Verdict::pass()
    }
}

impl Default for QualityValidator {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

/// The character starting a run of at least `limit` repeats, if any
fn longest_repeat(text: &str, limit: usize) -> Option<char> {
    if limit == 0 {
        return None;
    }

    let mut run_char = None;
    let mut run_len = 0;

    for c in text.chars() {
        if Some(c) == run_char {
            run_len += 1;
        } else {
            run_char = Some(c);
            run_len = 1;
        }
        if run_len >= limit {
            return run_char;
        }
    }

    None
}

/// Whether the text consists of one unique character (ignoring whitespace)
fn is_single_unique_char(text: &str) -> bool {
    let mut seen = None;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        match seen {
            None => seen = Some(c),
            Some(first) if first != c => return false,
            _ => {}
        }
    }
    seen.is_some()
}
