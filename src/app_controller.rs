use anyhow::{anyhow, Result};
use chrono::Local;
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::translation::core::TokenUsageStats;
use crate::translation::{BatchTranslator, FileReport, RateLimiter, TranslationService};

// @module: Application controller for catalog translation runs

/// State shared by one project run and discarded at its end.
///
/// Everything cross-file lives here explicitly: the backend rate limiter
/// and the run clock. There are no process-wide registries.
pub struct RunContext {
    /// Limiter shared by every backend call of the run
    pub limiter: Arc<RateLimiter>,
    /// Wall-clock start of the run
    pub started_at: chrono::DateTime<Local>,
}

impl RunContext {
    /// Create the context for one run from the batch configuration
    pub fn new(config: &Config) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(
                config.batch.rate_limit_count,
                config.batch.rate_limit_window_ms,
            )),
            started_at: Local::now(),
        }
    }
}

/// Aggregated outcome of one run
#[derive(Default)]
pub struct RunSummary {
    /// Per-file reports in completion order
    pub reports: Vec<FileReport>,
    /// Aggregated token usage across all files
    pub tokens: Option<TokenUsageStats>,
    /// Total run duration in seconds
    pub duration_secs: f64,
}

impl RunSummary {
    /// Number of files that could not be processed at all
    pub fn fatal_files(&self) -> usize {
        self.reports.iter().filter(|r| r.fatal.is_some()).count()
    }

    /// Total units accepted across all files
    pub fn accepted(&self) -> usize {
        self.reports.iter().map(|r| r.accepted).sum()
    }

    /// Total units still pending across all files
    pub fn remaining(&self) -> usize {
        self.reports.iter().map(|r| r.remaining()).sum()
    }

    /// Render the end-of-run report
    pub fn render(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            out.push_str(&report.summary());
            out.push('\n');
        }

        let rejected: usize = self
            .reports
            .iter()
            .map(|r| r.rejected_quality + r.rejected_language + r.rejected_semantic)
            .sum();
        let failed_batches: usize = self.reports.iter().map(|r| r.failed_batches).sum();
        let persist_errors: usize = self.reports.iter().map(|r| r.persist_errors).sum();

        out.push_str(&format!(
            "Run finished in {:.1}s: {} file(s), {} translated, {} rejected, {} still pending",
            self.duration_secs,
            self.reports.len(),
            self.accepted(),
            rejected,
            self.remaining(),
        ));
        if failed_batches > 0 || persist_errors > 0 {
            out.push_str(&format!(
                " ({} failed batches, {} persist errors)",
                failed_batches, persist_errors
            ));
        }
        if self.fatal_files() > 0 {
            out.push_str(&format!(", {} file(s) unreadable", self.fatal_files()));
        }
        if let Some(tokens) = &self.tokens {
            out.push('\n');
            out.push_str(&tokens.summary());
        }
        out
    }
}

/// Main application controller for catalog translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    /// Probe the configured provider before starting a run
    pub async fn test_connection(&self) -> Result<()> {
        let service = TranslationService::new(self.config.translation.clone())?;
        service.test_connection().await
    }

    /// Run the pipeline over a catalog file or a directory of catalogs
    pub async fn run(&self, input_path: PathBuf) -> Result<RunSummary> {
        let start_time = Instant::now();

        let files = self.collect_files(&input_path)?;
        if files.is_empty() {
            return Err(anyhow!("No catalog files found under {:?}", input_path));
        }
        info!(
            "Translating {} catalog file(s) to {}",
            files.len(),
            self.config.target_language
        );

        let context = RunContext::new(&self.config);
        let service = Arc::new(
            TranslationService::new(self.config.translation.clone())?
                .with_rate_limiter(context.limiter.clone()),
        );
        let translator = Arc::new(BatchTranslator::new(service, self.config.clone()));

        let summary = self
            .run_files(translator, files, start_time)
            .await;

        Ok(summary)
    }

    /// Run a prepared translator over a set of files.
    ///
    /// Files proceed concurrently up to the configured cap; each file's
    /// batches stay strictly sequential inside `BatchTranslator`.
    pub async fn run_files(
        &self,
        translator: Arc<BatchTranslator>,
        files: Vec<PathBuf>,
        start_time: Instant,
    ) -> RunSummary {
        let concurrency = if self.config.batch.force_serial {
            1
        } else {
            self.config.batch.max_concurrent_files.max(1)
        };

        let multi_progress = MultiProgress::new();
        let bar = multi_progress.add(ProgressBar::new(files.len() as u64));
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let results: Vec<(FileReport, TokenUsageStats)> = stream::iter(files.into_iter())
            .map(|path| {
                let translator = translator.clone();
                let bar = bar.clone();
                async move {
                    let result = translator.translate_file(&path).await;
                    bar.set_message(
                        path.file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_default(),
                    );
                    bar.inc(1);
                    result
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        bar.finish_and_clear();

        let mut summary = RunSummary {
            duration_secs: start_time.elapsed().as_secs_f64(),
            ..Default::default()
        };

        let mut tokens = TokenUsageStats::with_provider_info(
            self.config.translation.provider.to_string(),
            self.config.translation.get_model(),
        );
        for (report, file_tokens) in results {
            tokens.add_token_usage(
                Some(file_tokens.prompt_tokens),
                Some(file_tokens.completion_tokens),
            );
            if report.fatal.is_some() {
                warn!("{}", report.summary());
            }
            summary.reports.push(report);
        }
        summary.tokens = Some(tokens);

        summary
    }

    /// Resolve the input path into the list of catalog files to process
    fn collect_files(&self, input_path: &PathBuf) -> Result<Vec<PathBuf>> {
        if FileManager::file_exists(input_path) {
            if !FileManager::is_catalog_file(input_path) {
                return Err(anyhow!("{:?} is not a Linguist TS catalog", input_path));
            }
            return Ok(vec![input_path.clone()]);
        }

        if FileManager::dir_exists(input_path) {
            return FileManager::find_catalog_files(input_path);
        }

        Err(anyhow!("Input path does not exist: {:?}", input_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_withDefaultConfig_shouldInitialize() {
        let controller = Controller::with_config(Config::default()).unwrap();
        assert!(controller.is_initialized());
    }

    #[test]
    fn test_controller_collectFiles_missingPath_shouldError() {
        let controller = Controller::with_config(Config::default()).unwrap();
        let result = controller.collect_files(&PathBuf::from("/does/not/exist"));
        assert!(result.is_err());
    }
}
