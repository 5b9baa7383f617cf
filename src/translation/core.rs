/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct and its implementation,
 * which is responsible for translating catalog units using various AI providers.
 */

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use log::{debug, warn};

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::catalog::TranslationUnit;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::mock::MockProvider;
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::Provider;

use super::cache::TranslationCache;
use super::prompts;
use super::rate_limit::RateLimiter;
use super::reconcile::reconcile;
use super::response::{recover_items, ParseOutcome};

/// Token usage statistics for tracking API consumption
#[derive(Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    /// Create a new empty token usage stats instance
    pub fn new() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            start_time: Instant::now(),
            provider: String::new(),
            model: String::new(),
        }
    }

    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            provider,
            model,
            ..Self::new()
        }
    }

    /// Add token usage numbers
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Generate a one-line summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "{}/{}: {} prompt + {} completion = {} tokens in {:.1}s",
            self.provider,
            self.model,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.start_time.elapsed().as_secs_f64()
        )
    }
}

/// Raw output of one chat call
#[derive(Debug, Clone)]
pub struct ChatOutput {
    /// The model's text answer
    pub text: String,
    /// Prompt tokens consumed, when the provider reports them
    pub prompt_tokens: Option<u64>,
    /// Completion tokens consumed, when the provider reports them
    pub completion_tokens: Option<u64>,
}

/// Translation provider implementation variants
enum TranslationProviderImpl {
    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// OpenAI API service
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },

    /// Scriptable in-process provider for tests
    Mock {
        /// Client instance
        client: MockProvider,
    },
}

/// Main translation service for catalog translation
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// Shared call-rate limiter; every backend request passes through it
    limiter: Arc<RateLimiter>,

    /// Translation cache for storing and retrieving accepted translations
    pub cache: TranslationCache,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let retry_count = config.common.retry_count;
        let retry_backoff_ms = config.common.retry_backoff_ms;
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Ollama => TranslationProviderImpl::Ollama {
                client: Ollama::new_with_config(
                    config.get_endpoint(),
                    timeout_secs,
                    retry_count,
                    retry_backoff_ms,
                ),
            },
            ConfigTranslationProvider::OpenAI => TranslationProviderImpl::OpenAI {
                client: OpenAI::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    timeout_secs,
                    retry_count,
                    retry_backoff_ms,
                ),
            },
            ConfigTranslationProvider::Anthropic => TranslationProviderImpl::Anthropic {
                client: Anthropic::new_with_config(
                    config.get_api_key(),
                    config.get_endpoint(),
                    timeout_secs,
                    retry_count,
                    retry_backoff_ms,
                ),
            },
        };

        Ok(Self {
            provider,
            config,
            limiter: Arc::new(RateLimiter::unlimited()),
            cache: TranslationCache::new(true), // Enable cache by default
        })
    }

    /// Create a service backed by a scriptable mock provider
    pub fn with_mock(config: TranslationConfig, mock: MockProvider) -> Self {
        Self {
            provider: TranslationProviderImpl::Mock { client: mock },
            config,
            limiter: Arc::new(RateLimiter::unlimited()),
            cache: TranslationCache::new(true),
        }
    }

    /// Attach a shared rate limiter
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Access the scripted mock, when one backs this service
    pub fn mock(&self) -> Option<&MockProvider> {
        match &self.provider {
            TranslationProviderImpl::Mock { client } => Some(client),
            _ => None,
        }
    }

    /// Send one chat exchange to the active provider.
    ///
    /// Every network call of the pipeline funnels through here, so the
    /// shared rate limiter sees them all.
    pub async fn chat(&self, system: &str, user: &str) -> Result<ChatOutput, ProviderError> {
        self.limiter.acquire().await;

        let model = self.config.get_model();
        let temperature = self.config.common.temperature;

        match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let request = GenerationRequest::new(&model, user)
                    .system(system)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Ok(ChatOutput {
                    text: Ollama::extract_text(&response),
                    prompt_tokens: None,
                    completion_tokens: None,
                })
            }
            TranslationProviderImpl::OpenAI { client } => {
                let request = OpenAIRequest::new(&model)
                    .add_message("system", system)
                    .add_message("user", user)
                    .temperature(temperature)
                    .max_tokens(max_tokens_for_model(&model));
                let response = client.complete(request).await?;
                let (prompt_tokens, completion_tokens) = match &response.usage {
                    Some(usage) => (
                        Some(usage.prompt_tokens as u64),
                        Some(usage.completion_tokens as u64),
                    ),
                    None => (None, None),
                };
                Ok(ChatOutput {
                    text: OpenAI::extract_text(&response),
                    prompt_tokens,
                    completion_tokens,
                })
            }
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(&model, max_tokens_for_model(&model))
                    .system(system)
                    .add_message("user", user)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Ok(ChatOutput {
                    prompt_tokens: Some(response.usage.input_tokens as u64),
                    completion_tokens: Some(response.usage.output_tokens as u64),
                    text: Anthropic::extract_text(&response),
                })
            }
            TranslationProviderImpl::Mock { client } => {
                let text = client.complete_raw(system, user).await?;
                Ok(ChatOutput {
                    text,
                    prompt_tokens: None,
                    completion_tokens: None,
                })
            }
        }
    }

    /// Send a batch of units to the backend and run staged response recovery
    pub async fn request_batch(
        &self,
        units: &[TranslationUnit],
        source_language: &str,
        target_language: &str,
        stats: &mut TokenUsageStats,
    ) -> Result<ParseOutcome, TranslationError> {
        let system = prompts::batch_system_prompt(source_language, target_language);
        let user = prompts::batch_user_prompt(units, source_language, target_language);

        let output = self.chat(&system, &user).await.map_err(TranslationError::Network)?;
        stats.add_token_usage(output.prompt_tokens, output.completion_tokens);

        let outcome = recover_items(&output.text);
        match &outcome {
            ParseOutcome::Strict(items) => {
                debug!("Batch response parsed strictly ({} items)", items.len());
            }
            ParseOutcome::Repaired(items) => {
                warn!("Batch response needed syntactic repair ({} items)", items.len());
            }
            ParseOutcome::PatternExtracted(items) => {
                warn!("Batch response recovered by pattern extraction ({} items)", items.len());
            }
            ParseOutcome::Failed(reason) => {
                warn!("Batch response unrecoverable: {}", reason);
            }
        }

        Ok(outcome)
    }

    /// Translate a batch of units in place.
    ///
    /// Fills `candidate` on every unit whose response entry could be proven,
    /// from the cache or the backend, and returns how many were filled.
    /// Units the backend omitted or misaligned keep `candidate = None`.
    pub async fn translate_units(
        &self,
        units: &mut [TranslationUnit],
        source_language: &str,
        target_language: &str,
        stats: &mut TokenUsageStats,
    ) -> Result<usize, TranslationError> {
        let mut filled = 0;
        let mut uncached: Vec<usize> = Vec::new();

        for (idx, unit) in units.iter_mut().enumerate() {
            match self.cache.get(&unit.source, source_language, target_language) {
                Some(hit) => {
                    unit.candidate = Some(hit);
                    filled += 1;
                }
                None => uncached.push(idx),
            }
        }

        if uncached.is_empty() {
            return Ok(filled);
        }

        let subset: Vec<TranslationUnit> = uncached.iter().map(|&i| units[i].clone()).collect();
        let outcome = self
            .request_batch(&subset, source_language, target_language, stats)
            .await?;

        if let ParseOutcome::Failed(reason) = &outcome {
            return Err(TranslationError::Parse(reason.clone()));
        }

        let items = outcome.items();
        let mappings = reconcile(&subset, items);

        for mapping in &mappings {
            let (true, Some(response_index)) = (mapping.is_valid, mapping.response_index) else {
                continue;
            };
            units[uncached[mapping.source_index]].candidate =
                Some(items[response_index].translation.clone());
            filled += 1;
        }

        Ok(filled)
    }

    /// Back-translate candidate texts into the source language, aligned to
    /// the input order. Unprovable entries come back as None.
    pub async fn back_translate(
        &self,
        texts: &[&str],
        source_language: &str,
        target_language: &str,
        stats: &mut TokenUsageStats,
    ) -> Result<Vec<Option<String>>, TranslationError> {
        let system = prompts::batch_system_prompt(target_language, source_language);
        let user = prompts::back_translate_user_prompt(texts, target_language, source_language);

        let output = self.chat(&system, &user).await.map_err(TranslationError::Network)?;
        stats.add_token_usage(output.prompt_tokens, output.completion_tokens);

        let outcome = recover_items(&output.text);
        if let ParseOutcome::Failed(reason) = &outcome {
            return Err(TranslationError::Parse(reason.clone()));
        }

        let pseudo_units: Vec<TranslationUnit> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| TranslationUnit {
                index,
                context: String::new(),
                source: text.to_string(),
                comment: None,
                target: crate::catalog::UnitRef {
                    context_idx: 0,
                    message_idx: index,
                },
                candidate: None,
            })
            .collect();

        let items = outcome.items();
        let mappings = reconcile(&pseudo_units, items);

        let mut aligned = vec![None; texts.len()];
        for mapping in &mappings {
            if let (true, Some(response_index)) = (mapping.is_valid, mapping.response_index) {
                aligned[mapping.source_index] = Some(items[response_index].translation.clone());
            }
        }

        Ok(aligned)
    }

    /// Ask the backend a yes/no question
    pub async fn yes_no(&self, system: &str, user: &str) -> Result<bool, ProviderError> {
        let output = self.chat(system, user).await?;
        let answer = output.text.trim().to_uppercase();
        Ok(answer.starts_with("YES") || answer.starts_with("\"YES"))
    }

    /// Ask the batched semantic judge for per-pair equivalence verdicts
    pub async fn semantic_verdicts(
        &self,
        pairs: &[(String, String)],
        stats: &mut TokenUsageStats,
    ) -> Result<Vec<bool>, TranslationError> {
        let user = prompts::semantic_judge_user_prompt(pairs);
        let output = self
            .chat(prompts::SEMANTIC_JUDGE, &user)
            .await
            .map_err(TranslationError::Network)?;
        stats.add_token_usage(output.prompt_tokens, output.completion_tokens);

        parse_bool_array(&output.text)
            .filter(|verdicts| verdicts.len() == pairs.len())
            .ok_or_else(|| {
                TranslationError::Parse("Semantic judge returned an unusable answer".to_string())
            })
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<()> {
        match &self.provider {
            TranslationProviderImpl::Ollama { client } => client
                .test_connection()
                .await
                .map_err(|e| anyhow!("Failed to connect to Ollama: {}", e)),
            TranslationProviderImpl::OpenAI { client } => client
                .test_connection()
                .await
                .map_err(|e| anyhow!("Failed to connect to OpenAI API: {}", e)),
            TranslationProviderImpl::Anthropic { client } => client
                .test_connection()
                .await
                .map_err(|e| anyhow!("Failed to connect to Anthropic API: {}", e)),
            TranslationProviderImpl::Mock { .. } => Ok(()),
        }
    }
}

/// Parse a JSON array of booleans, tolerating fences and surrounding prose
fn parse_bool_array(raw: &str) -> Option<Vec<bool>> {
    let trimmed = raw.trim();
    if let Ok(values) = serde_json::from_str::<Vec<bool>>(trimmed) {
        return Some(values);
    }

    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Vec<bool>>(&trimmed[start..=end]).ok()
}

/// Get the maximum number of tokens to request for a given model
fn max_tokens_for_model(model: &str) -> u32 {
    match model {
        // Large-context chat models can take the full batch in one answer
        m if m.starts_with("gpt-4") => 8192,
        m if m.starts_with("claude-3-opus") => 4096,
        m if m.starts_with("claude-3") => 4096,

        // Default for unknown models
        _ => 4096,
    }
}
