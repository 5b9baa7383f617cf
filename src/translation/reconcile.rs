/*!
 * Response-to-request realignment.
 *
 * A translation must never be written into the wrong source string's slot.
 * Positions are trusted only while every echoed source agrees with the
 * request at the same index; after the first disagreement, identity must be
 * proven by unique content match or the unit stays pending. Fail closed:
 * an untranslated entry beats a silent swap.
 */

use std::collections::HashMap;

use crate::catalog::TranslationUnit;

use super::response::ResponseItem;

/// Why a mapping turned out valid or invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingReason {
    /// Response count and every echoed source lined up positionally
    Positional,
    /// Uniquely matched by normalized source content
    ContentMatch,
    /// The backend returned no entry for this unit
    MissingResponse,
    /// More than one unit or response shares this source text
    AmbiguousSource,
}

impl std::fmt::Display for MappingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MappingReason::Positional => "positional",
            MappingReason::ContentMatch => "content-match",
            MappingReason::MissingResponse => "missing-response",
            MappingReason::AmbiguousSource => "ambiguous-source",
        };
        write!(f, "{}", label)
    }
}

/// The alignment decision for one request unit
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Index of the unit within the batch
    pub source_index: usize,
    /// Index of the response entry that answers it, when one was proven
    pub response_index: Option<usize>,
    /// Whether the unit may be filled from the response
    pub is_valid: bool,
    /// How the decision was reached
    pub reason: MappingReason,
}

/// Map response entries back to the request units they answer.
///
/// Returns exactly one mapping per unit, in unit order.
pub fn reconcile(units: &[TranslationUnit], responses: &[ResponseItem]) -> Vec<Mapping> {
    let unit_norms: Vec<String> = units.iter().map(|u| normalize(&u.source)).collect();
    let response_norms: Vec<Option<String>> = responses
        .iter()
        .map(|r| r.source.as_deref().map(normalize))
        .collect();

    if positionally_aligned(&unit_norms, &response_norms) {
        return (0..units.len())
            .map(|i| Mapping {
                source_index: i,
                response_index: Some(i),
                is_valid: true,
                reason: MappingReason::Positional,
            })
            .collect();
    }

    content_remap(&unit_norms, &response_norms)
}

/// Positions are trustworthy only when counts match and no echoed source
/// disagrees with the request at its index
fn positionally_aligned(unit_norms: &[String], response_norms: &[Option<String>]) -> bool {
    if unit_norms.len() != response_norms.len() {
        return false;
    }

    unit_norms
        .iter()
        .zip(response_norms.iter())
        .all(|(unit, response)| match response {
            Some(echoed) => echoed == unit,
            // An absent echo cannot disagree
            None => true,
        })
}

/// Content-based remap: each unit may consume the single unused response
/// whose echoed source equals its own. Duplicates on either side are not
/// guessed at.
fn content_remap(unit_norms: &[String], response_norms: &[Option<String>]) -> Vec<Mapping> {
    let mut unit_counts: HashMap<&str, usize> = HashMap::new();
    for norm in unit_norms {
        *unit_counts.entry(norm.as_str()).or_default() += 1;
    }

    let mut response_counts: HashMap<&str, usize> = HashMap::new();
    for norm in response_norms.iter().flatten() {
        *response_counts.entry(norm.as_str()).or_default() += 1;
    }

    let mut used = vec![false; response_norms.len()];
    let mut mappings = Vec::with_capacity(unit_norms.len());

    for (source_index, unit_norm) in unit_norms.iter().enumerate() {
        let duplicated = unit_counts.get(unit_norm.as_str()).copied().unwrap_or(0) > 1
            || response_counts.get(unit_norm.as_str()).copied().unwrap_or(0) > 1;

        if duplicated {
            mappings.push(Mapping {
                source_index,
                response_index: None,
                is_valid: false,
                reason: MappingReason::AmbiguousSource,
            });
            continue;
        }

        let matched = response_norms.iter().enumerate().find(|(j, norm)| {
            !used[*j] && norm.as_deref() == Some(unit_norm.as_str())
        });

        match matched {
            Some((response_index, _)) => {
                used[response_index] = true;
                mappings.push(Mapping {
                    source_index,
                    response_index: Some(response_index),
                    is_valid: true,
                    reason: MappingReason::ContentMatch,
                });
            }
            None => {
                mappings.push(Mapping {
                    source_index,
                    response_index: None,
                    is_valid: false,
                    reason: MappingReason::MissingResponse,
                });
            }
        }
    }

    mappings
}

/// Normalize a source string for comparison: trim, unify quote, dash, and
/// ellipsis variants, collapse whitespace runs
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.trim().chars() {
        let mapped = match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_whitespace() => ' ',
            c => c,
        };

        if mapped == ' ' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else if mapped == '\u{2026}' {
            out.push_str("...");
            last_was_space = false;
        } else {
            out.push(mapped);
            last_was_space = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitRef;

    fn unit(index: usize, source: &str) -> TranslationUnit {
        TranslationUnit {
            index,
            context: "Ctx".to_string(),
            source: source.to_string(),
            comment: None,
            target: UnitRef { context_idx: 0, message_idx: index },
            candidate: None,
        }
    }

    fn item(source: Option<&str>, translation: &str) -> ResponseItem {
        ResponseItem {
            source: source.map(|s| s.to_string()),
            translation: translation.to_string(),
            index: None,
        }
    }

    #[test]
    fn test_reconcile_alignedBatch_shouldMapPositionally() {
        let units = vec![unit(0, "One"), unit(1, "Two"), unit(2, "Three")];
        let responses = vec![
            item(Some("One"), "Un"),
            item(Some("Two"), "Deux"),
            item(Some("Three"), "Trois"),
        ];

        let mappings = reconcile(&units, &responses);
        assert!(mappings.iter().all(|m| m.is_valid));
        assert!(mappings.iter().all(|m| m.reason == MappingReason::Positional));
        assert_eq!(mappings[2].response_index, Some(2));
    }

    #[test]
    fn test_reconcile_noEchoedSources_shouldTrustPositions() {
        let units = vec![unit(0, "One"), unit(1, "Two")];
        let responses = vec![item(None, "Un"), item(None, "Deux")];

        let mappings = reconcile(&units, &responses);
        assert!(mappings.iter().all(|m| m.is_valid));
    }

    #[test]
    fn test_reconcile_swappedEchoes_shouldRemapByContent() {
        let units = vec![unit(0, "One"), unit(1, "Two"), unit(2, "Three")];
        let responses = vec![
            item(Some("Two"), "Deux"),
            item(Some("One"), "Un"),
            item(Some("Three"), "Trois"),
        ];

        let mappings = reconcile(&units, &responses);
        assert!(mappings.iter().all(|m| m.is_valid));
        assert_eq!(mappings[0].response_index, Some(1));
        assert_eq!(mappings[1].response_index, Some(0));
        assert_eq!(mappings[2].response_index, Some(2));
        assert!(mappings.iter().all(|m| m.reason == MappingReason::ContentMatch));
    }

    #[test]
    fn test_reconcile_omittedEntry_shouldLeaveUnitUnmapped() {
        let units = vec![unit(0, "One"), unit(1, "Two"), unit(2, "Three")];
        let responses = vec![item(Some("One"), "Un"), item(Some("Three"), "Trois")];

        let mappings = reconcile(&units, &responses);
        assert!(mappings[0].is_valid);
        assert!(!mappings[1].is_valid);
        assert_eq!(mappings[1].reason, MappingReason::MissingResponse);
        assert!(mappings[2].is_valid);
    }

    #[test]
    fn test_reconcile_duplicateSources_shouldFailClosed() {
        // Echo mismatch at position 0 forces content remap; the duplicated
        // source is then ambiguous on both sides
        let units = vec![unit(0, "OK"), unit(1, "OK"), unit(2, "Quit")];
        let responses = vec![
            item(Some("Quit"), "Quitter"),
            item(Some("OK"), "Bien"),
            item(Some("OK"), "D'accord"),
        ];

        let mappings = reconcile(&units, &responses);
        assert!(!mappings[0].is_valid);
        assert!(!mappings[1].is_valid);
        assert_eq!(mappings[0].reason, MappingReason::AmbiguousSource);
        assert!(mappings[2].is_valid);
    }

    #[test]
    fn test_reconcile_countMismatch_shouldNeverFillPositionally() {
        // Four responses for three units: echoes disagree positionally, and
        // none of the extra entries may land by position
        let units = vec![unit(0, "One"), unit(1, "Two")];
        let responses = vec![
            item(Some("Two"), "Deux"),
            item(Some("Bogus"), "???"),
            item(Some("One"), "Un"),
        ];

        let mappings = reconcile(&units, &responses);
        assert!(mappings[0].is_valid);
        assert_eq!(mappings[0].response_index, Some(2));
        assert!(mappings[1].is_valid);
        assert_eq!(mappings[1].response_index, Some(0));
    }

    #[test]
    fn test_normalize_quoteAndSpaceVariants_shouldUnify() {
        assert_eq!(normalize("  \u{201C}Hello\u{201D}   world "), "\"Hello\" world");
        assert_eq!(normalize("wait\u{2026}"), "wait...");
        assert_eq!(normalize("a \u{2014} b"), "a - b");
    }
}
