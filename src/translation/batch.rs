/*!
 * Batch translation pipeline for one catalog file.
 *
 * Runs the per-file loop: extract pending units, cut them into batches,
 * dispatch each batch to the backend, realign and validate the candidates,
 * write accepted translations into the document, and persist after every
 * batch so partial progress survives a crash.
 *
 * Batches of one file are strictly sequential: a batch fully completes
 * (translate, validate, persist) before the next one starts, because the
 * writer serializes the whole document on every save.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::app_config::{Config, ValidationMode};
use crate::catalog::{parser, TranslationUnit, TsDocument};
use crate::validation::{LanguageDetector, QualityValidator, SemanticValidator};

use super::core::{TokenUsageStats, TranslationService};

/// Per-file outcome counters
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    /// The catalog file this report covers
    pub path: PathBuf,
    /// Pending units found at extraction time
    pub pending_before: usize,
    /// Units accepted and written into the document
    pub accepted: usize,
    /// Units rejected by the quality heuristics
    pub rejected_quality: usize,
    /// Units rejected by language detection
    pub rejected_language: usize,
    /// Units rejected by semantic validation
    pub rejected_semantic: usize,
    /// Units the backend omitted or that could not be realigned
    pub unmapped: usize,
    /// Batches dropped whole (network or unrecoverable payload)
    pub failed_batches: usize,
    /// Failed persistence attempts
    pub persist_errors: usize,
    /// Number of batches dispatched
    pub batches: usize,
    /// Fatal error that prevented processing the file at all
    pub fatal: Option<String>,
}

impl FileReport {
    /// Units still pending after the run
    pub fn remaining(&self) -> usize {
        self.pending_before.saturating_sub(self.accepted)
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        if let Some(fatal) = &self.fatal {
            return format!("{}: FAILED ({})", self.path.display(), fatal);
        }
        format!(
            "{}: {}/{} translated ({} rejected, {} unmapped, {} failed batches)",
            self.path.display(),
            self.accepted,
            self.pending_before,
            self.rejected_quality + self.rejected_language + self.rejected_semantic,
            self.unmapped,
            self.failed_batches
        )
    }
}

/// Batch translator driving the pipeline for single catalog files
pub struct BatchTranslator {
    /// The translation service to use
    service: Arc<TranslationService>,

    /// Full application configuration
    config: Config,

    /// Quality gate
    quality: QualityValidator,

    /// Semantic gate (used in semantic mode only)
    semantic: SemanticValidator,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(service: Arc<TranslationService>, config: Config) -> Self {
        let quality = QualityValidator::new(config.validation.quality.clone());
        let semantic = SemanticValidator::new(config.validation.similarity_threshold);
        Self {
            service,
            config,
            quality,
            semantic,
        }
    }

    /// Load a catalog file and run the pipeline over it
    pub async fn translate_file<P: AsRef<Path>>(&self, path: P) -> (FileReport, TokenUsageStats) {
        let path = path.as_ref();

        let mut document = match parser::parse_file(path) {
            Ok(document) => document,
            Err(e) => {
                error!("Cannot process {}: {}", path.display(), e);
                let report = FileReport {
                    path: path.to_path_buf(),
                    fatal: Some(e.to_string()),
                    ..Default::default()
                };
                return (report, TokenUsageStats::new());
            }
        };

        self.translate_document(&mut document).await
    }

    /// Run the pipeline over an already-loaded document.
    ///
    /// The document is persisted after every batch when it carries a path.
    pub async fn translate_document(
        &self,
        document: &mut TsDocument,
    ) -> (FileReport, TokenUsageStats) {
        let mut report = FileReport {
            path: document.path.clone().unwrap_or_default(),
            ..Default::default()
        };
        let mut stats = TokenUsageStats::with_provider_info(
            self.config.translation.provider.to_string(),
            self.config.translation.get_model(),
        );

        let units = document.pending_units();
        report.pending_before = units.len();

        if units.is_empty() {
            debug!("{}: nothing to translate", report.path.display());
            return (report, stats);
        }

        let batches = split_into_batches(
            units,
            self.config.batch.batch_size,
            self.config.translation.get_max_chars_per_request(),
        );
        report.batches = batches.len();
        info!(
            "{}: {} pending units in {} batches",
            report.path.display(),
            report.pending_before,
            report.batches
        );

        for (batch_index, mut batch) in batches.into_iter().enumerate() {
            if batch_index > 0 && self.config.batch.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch.batch_delay_ms)).await;
            }

            self.run_batch(document, &mut batch, batch_index, &mut report, &mut stats)
                .await;
        }

        (report, stats)
    }

    /// Translate, validate, apply, and persist one batch
    async fn run_batch(
        &self,
        document: &mut TsDocument,
        batch: &mut [TranslationUnit],
        batch_index: usize,
        report: &mut FileReport,
        stats: &mut TokenUsageStats,
    ) {
        let source_language = &self.config.source_language;
        let target_language = &self.config.target_language;

        if let Err(e) = self
            .service
            .translate_units(batch, source_language, target_language, stats)
            .await
        {
            warn!(
                "{}: batch {} failed, units stay pending: {}",
                report.path.display(),
                batch_index + 1,
                e
            );
            report.failed_batches += 1;
            return;
        }

        // Quality and language gates, per unit
        let mut survivors: Vec<&TranslationUnit> = Vec::new();
        for unit in batch.iter() {
            let Some(candidate) = &unit.candidate else {
                debug!("Unit '{}' got no aligned response, stays pending", unit.source);
                report.unmapped += 1;
                continue;
            };

            let verdict = self.quality.validate(&unit.source, candidate);
            if !verdict.pass {
                debug!("Unit '{}' rejected by quality gate: {}", unit.source, verdict.reason);
                report.rejected_quality += 1;
                continue;
            }

            if self.config.validation.mode != ValidationMode::None {
                let verdict =
                    LanguageDetector::check(&self.service, candidate, target_language).await;
                if !verdict.pass {
                    debug!(
                        "Unit '{}' rejected by language gate: {}",
                        unit.source, verdict.reason
                    );
                    report.rejected_language += 1;
                    continue;
                }
            }

            survivors.push(unit);
        }

        // Semantic gate, batched
        if self.config.validation.mode == ValidationMode::Semantic && !survivors.is_empty() {
            let pairs: Vec<(String, String)> = survivors
                .iter()
                .map(|u| {
                    (
                        u.source.clone(),
                        u.candidate.clone().unwrap_or_default(),
                    )
                })
                .collect();

            let verdicts = self
                .semantic
                .check_batch(&self.service, &pairs, source_language, target_language, stats)
                .await;

            let mut kept = Vec::with_capacity(survivors.len());
            for (unit, verdict) in survivors.into_iter().zip(verdicts) {
                if verdict.pass {
                    kept.push(unit);
                } else {
                    debug!(
                        "Unit '{}' rejected by semantic gate: {}",
                        unit.source, verdict.reason
                    );
                    report.rejected_semantic += 1;
                }
            }
            survivors = kept;
        }

        if survivors.is_empty() {
            return;
        }

        // Apply accepted candidates and persist the document
        let keep_marker = self.config.translation.common.keep_unfinished_marker;
        let accepted: Vec<(crate::catalog::UnitRef, String, String)> = survivors
            .iter()
            .map(|u| {
                (
                    u.target,
                    u.source.clone(),
                    u.candidate.clone().unwrap_or_default(),
                )
            })
            .collect();

        for (target, source, translation) in &accepted {
            if document.apply_translation(*target, translation, keep_marker) {
                self.service
                    .cache
                    .store(source, source_language, target_language, translation);
                report.accepted += 1;
            } else {
                warn!("Stale unit reference for '{}', skipping", source);
            }
        }

        if document.path.is_some() {
            if let Err(e) = document.save() {
                error!(
                    "{}: persistence failed after batch {}: {}",
                    report.path.display(),
                    batch_index + 1,
                    e
                );
                report.persist_errors += 1;
            }
        }
    }
}

/// Split units into batches bounded by unit count and source characters.
///
/// An oversized single unit gets its own batch rather than being dropped.
pub fn split_into_batches(
    units: Vec<TranslationUnit>,
    max_units: usize,
    max_chars: usize,
) -> Vec<Vec<TranslationUnit>> {
    let total = units.len();
    let max_units = max_units.max(1);
    let max_chars = max_chars.max(100);

    let mut batches = Vec::new();
    let mut current: Vec<TranslationUnit> = Vec::new();
    let mut current_chars = 0;

    for unit in units {
        let unit_chars = unit.source_chars();

        if unit_chars > max_chars {
            if !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            debug!(
                "Oversized unit ({} chars) placed in its own batch",
                unit_chars
            );
            batches.push(vec![unit]);
            continue;
        }

        if !current.is_empty()
            && (current.len() >= max_units || current_chars + unit_chars > max_chars)
        {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        current_chars += unit_chars;
        current.push(unit);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    let chunked: usize = batches.iter().map(|b| b.len()).sum();
    if chunked != total {
        error!(
            "Lost units during batching: {} before, {} after",
            total, chunked
        );
    }

    batches
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

    #[test]
    fn test_splitIntoBatches_unitCap_shouldChunkEvenly() {
        let units: Vec<_> = (0..7).map(|i| unit(i, "word")).collect();
        let batches = split_into_batches(units, 3, 10_000);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[2].len(), 1);
    }

    #[test]
    fn test_splitIntoBatches_charBudget_shouldStartNewBatch() {
        let units = vec![unit(0, &"a".repeat(80)), unit(1, &"b".repeat(80))];
        let batches = split_into_batches(units, 10, 100);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_splitIntoBatches_oversizedUnit_shouldGetOwnBatch() {
        let units = vec![unit(0, "small"), unit(1, &"x".repeat(500)), unit(2, "tiny")];
        let batches = split_into_batches(units, 10, 100);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn test_splitIntoBatches_preservesDocumentOrder() {
        let units: Vec<_> = (0..5).map(|i| unit(i, "word")).collect();
        let batches = split_into_batches(units, 2, 10_000);
        let flattened: Vec<usize> = batches.into_iter().flatten().map(|u| u.index).collect();
        assert_eq!(flattened, vec![0, 1, 2, 3, 4]);
    }
}
