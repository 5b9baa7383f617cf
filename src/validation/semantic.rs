/*!
 * Semantic equivalence validation.
 *
 * Back-translates the batch's candidates into the source language and asks
 * an AI judge for per-pair equivalence, one judge call per batch. When the
 * judge is unavailable, a lexical similarity score over the back-translation
 * decides instead; when even the back-translation is unavailable, the units
 * are rejected and stay pending for a later run.
 */

use log::warn;

use crate::translation::core::{TokenUsageStats, TranslationService};

use super::{Evidence, Verdict};

/// Semantic validator for candidate translations
#[derive(Debug, Clone)]
pub struct SemanticValidator {
    /// Lexical similarity cutoff used by the fallback path
    similarity_threshold: f32,
}

impl SemanticValidator {
    /// Create a validator with the given fallback threshold
    pub fn new(similarity_threshold: f32) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Check a batch of (source, candidate) pairs, one verdict per pair
    pub async fn check_batch(
        &self,
        service: &TranslationService,
        pairs: &[(String, String)],
        source_language: &str,
        target_language: &str,
        stats: &mut TokenUsageStats,
    ) -> Vec<Verdict> {
        if pairs.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<&str> = pairs.iter().map(|(_, c)| c.as_str()).collect();
        let back = match service
            .back_translate(&candidates, source_language, target_language, stats)
            .await
        {
            Ok(back) => back,
            Err(e) => {
                warn!("Back-translation unavailable, rejecting batch: {}", e);
                return pairs
                    .iter()
                    .map(|_| Verdict::fail(format!("back-translation unavailable: {}", e)))
                    .collect();
            }
        };

        // One judge call for the whole batch; pairs without a usable
        // back-translation are rejected outright.
        let judged: Vec<(usize, (String, String))> = pairs
            .iter()
            .enumerate()
            .filter_map(|(i, (source, _))| {
                back[i]
                    .as_ref()
                    .map(|b| (i, (source.clone(), b.clone())))
            })
            .collect();

        let mut verdicts: Vec<Verdict> = pairs
            .iter()
            .map(|_| Verdict::fail("no back-translation for this entry"))
            .collect();

        if judged.is_empty() {
            return verdicts;
        }

        let judge_input: Vec<(String, String)> = judged.iter().map(|(_, p)| p.clone()).collect();
        let judge_result = service.semantic_verdicts(&judge_input, stats).await;

        match judge_result {
            Ok(flags) => {
                for ((index, (_, back_text)), equivalent) in judged.iter().zip(flags) {
                    verdicts[*index] = if equivalent {
                        Verdict::pass_with(Evidence::BackTranslation(back_text.clone()))
                    } else {
                        Verdict::fail_with(
                            "AI judge found the meanings differ",
                            Evidence::BackTranslation(back_text.clone()),
                        )
                    };
                }
            }
            Err(e) => {
                warn!("Semantic judge unavailable, using lexical fallback: {}", e);
                for (index, (source, back_text)) in &judged {
                    let score = lexical_similarity(source, back_text);
                    verdicts[*index] = if score >= self.similarity_threshold {
                        Verdict::pass_with(Evidence::Similarity(score))
                    } else {
                        Verdict::fail_with(
                            format!(
                                "lexical similarity {:.2} below threshold {:.2}",
                                score, self.similarity_threshold
                            ),
                            Evidence::Similarity(score),
                        )
                    };
                }
            }
        }

        verdicts
    }
}

/// Normalized lexical similarity: word-set Jaccard blended with character
/// edit distance, both case-folded
pub fn lexical_similarity(a: &str, b: &str) -> f32 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();

    let a_words: std::collections::HashSet<&str> = split_words(&a_lower).collect();
    let b_words: std::collections::HashSet<&str> = split_words(&b_lower).collect();

    let jaccard = if a_words.is_empty() && b_words.is_empty() {
        1.0
    } else {
        let intersection = a_words.intersection(&b_words).count() as f32;
        let union = a_words.union(&b_words).count() as f32;
        intersection / union
    };

    let max_len = a_lower.chars().count().max(b_lower.chars().count());
    let edit = if max_len == 0 {
        1.0
    } else {
        1.0 - levenshtein_distance(&a_lower, &b_lower) as f32 / max_len as f32
    };

    0.5 * jaccard + 0.5 * edit
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Classic two-row Levenshtein over characters
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshteinDistance_identical_shouldBeZero() {
        assert_eq!(levenshtein_distance("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshteinDistance_oneDifferent_shouldBeOne() {
        assert_eq!(levenshtein_distance("hello", "hallo"), 1);
        assert_eq!(levenshtein_distance("cat", "hat"), 1);
    }

    #[test]
    fn test_levenshteinDistance_empty_shouldReturnLength() {
        assert_eq!(levenshtein_distance("", "hello"), 5);
        assert_eq!(levenshtein_distance("hello", ""), 5);
    }

    #[test]
    fn test_lexicalSimilarity_identical_shouldBeOne() {
        assert!((lexical_similarity("open the file", "open the file") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_lexicalSimilarity_paraphrase_shouldScoreAboveGarbage() {
        let close = lexical_similarity("open the file", "open this file");
        let far = lexical_similarity("open the file", "quantum banana parade");
        assert!(close > far);
        assert!(close > 0.5);
        assert!(far < 0.2);
    }

    #[test]
    fn test_lexicalSimilarity_caseInsensitive_shouldMatch() {
        assert!((lexical_similarity("Open File", "open file") - 1.0).abs() < 0.01);
    }
}
