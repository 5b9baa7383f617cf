use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Batch scheduling and rate limiting config
    #[serde(default)]
    pub batch: BatchConfig,

    /// Validation config
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max source chars per batch request
    #[serde(default = "default_max_chars_per_request")]
    pub max_chars_per_request: usize,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                max_chars_per_request: default_max_chars_per_request(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                max_chars_per_request: default_max_chars_per_request(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                max_chars_per_request: default_anthropic_max_chars_per_request(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Keep the unfinished marker on accepted translations
    #[serde(default)]
    pub keep_unfinished_marker: bool,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            keep_unfinished_marker: false,
        }
    }
}

/// Batch scheduling and rate-limit configuration.
///
/// Batches within one catalog always run to completion (translate, validate,
/// persist) before the next batch of that catalog starts; these knobs bound
/// everything else.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Maximum number of units per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of catalog files processed concurrently
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,

    /// Maximum concurrent batches per file (writers are always serialized)
    #[serde(default = "default_max_concurrent_batches_per_file")]
    pub max_concurrent_batches_per_file: usize,

    /// Backend calls allowed per rate-limit window
    #[serde(default = "default_rate_limit_count")]
    pub rate_limit_count: u32,

    /// Rate-limit window in milliseconds
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Delay between consecutive batches of one file, in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Process files strictly one at a time regardless of other caps
    #[serde(default)]
    pub force_serial: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_files: default_max_concurrent_files(),
            max_concurrent_batches_per_file: default_max_concurrent_batches_per_file(),
            rate_limit_count: default_rate_limit_count(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            force_serial: false,
        }
    }
}

/// How much validation runs on each candidate translation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Quality heuristics only
    None,
    /// Quality heuristics + target-language detection
    #[default]
    Language,
    /// Quality heuristics + language detection + semantic equivalence
    Semantic,
}

/// Thresholds used by the quality validator.
///
/// These are tuning parameters, not invariants; the defaults match observed
/// LLM failure modes but every one of them can be overridden in the config
/// file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QualityConfig {
    /// Reject when translation length exceeds this multiple of source length
    #[serde(default = "default_max_length_ratio")]
    pub max_length_ratio: usize,

    /// Reject when one character repeats at least this many times in a row
    #[serde(default = "default_max_repeat_run")]
    pub max_repeat_run: usize,

    /// Reject a single-unique-character translation longer than this
    #[serde(default = "default_single_char_max_len")]
    pub single_char_max_len: usize,

    /// Source length above which a near-empty translation is suspicious
    #[serde(default = "default_long_source_len")]
    pub long_source_len: usize,

    /// Translation length at or below which it counts as near-empty
    #[serde(default = "default_short_translation_len")]
    pub short_translation_len: usize,

    /// Source length above which an identical echo counts as untranslated
    #[serde(default = "default_identical_echo_min_len")]
    pub identical_echo_min_len: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_length_ratio: default_max_length_ratio(),
            max_repeat_run: default_max_repeat_run(),
            single_char_max_len: default_single_char_max_len(),
            long_source_len: default_long_source_len(),
            short_translation_len: default_short_translation_len(),
            identical_echo_min_len: default_identical_echo_min_len(),
        }
    }
}

/// Validation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationConfig {
    /// Validation mode
    #[serde(default)]
    pub mode: ValidationMode,

    /// Quality validator thresholds
    #[serde(default)]
    pub quality: QualityConfig,

    /// Lexical similarity cutoff for the semantic fallback (0.0-1.0)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::default(),
            quality: QualityConfig::default(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_batch_size() -> usize {
    20
}

fn default_max_concurrent_files() -> usize {
    4
}

fn default_max_concurrent_batches_per_file() -> usize {
    1
}

fn default_rate_limit_count() -> u32 {
    45
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_batch_delay_ms() -> u64 {
    500 // 500ms default delay between batches
}

fn default_max_chars_per_request() -> usize {
    4000
}

fn default_anthropic_max_chars_per_request() -> usize {
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_length_ratio() -> usize {
    10
}

fn default_max_repeat_run() -> usize {
    20
}

fn default_single_char_max_len() -> usize {
    10
}

fn default_long_source_len() -> usize {
    50
}

fn default_short_translation_len() -> usize {
    2
}

fn default_identical_echo_min_len() -> usize {
    20
}

fn default_similarity_threshold() -> f32 {
    0.35
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_model() -> String {
    "llama2".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku".to_string()
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if self.batch.batch_size == 0 {
            return Err(anyhow!("batch_size must be at least 1"));
        }
        if self.batch.max_concurrent_files == 0 {
            return Err(anyhow!("max_concurrent_files must be at least 1"));
        }
        if self.batch.rate_limit_count == 0 {
            return Err(anyhow!("rate_limit_count must be at least 1"));
        }

        // Validate API key for all providers except Ollama
        match self.translation.provider {
            TranslationProvider::OpenAI => {
                let api_key = self.translation.get_api_key();
                if api_key.is_empty() {
                    return Err(anyhow!("Translation API key is required for OpenAI provider"));
                }
            },
            TranslationProvider::Anthropic => {
                let api_key = self.translation.get_api_key();
                if api_key.is_empty() {
                    return Err(anyhow!("Translation API key is required for Anthropic provider"));
                }
            },
            _ => {}
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            batch: BatchConfig::default(),
            validation: ValidationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get a specific provider configuration by type for testing
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::Ollama => default_ollama_model(),
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // Default fallback - Ollama doesn't use API keys
        String::new()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::Ollama => default_ollama_endpoint(),
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the max chars per request for the active provider
    pub fn get_max_chars_per_request(&self) -> usize {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.max_chars_per_request > 0 {
                return provider_config.max_chars_per_request;
            }
        }

        // Default fallback
        default_max_chars_per_request()
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        if let Some(provider_config) = self.get_active_provider_config() {
            if provider_config.timeout_secs > 0 {
                return provider_config.timeout_secs;
            }
        }

        match self.provider {
            TranslationProvider::Anthropic => default_anthropic_timeout_secs(),
            _ => default_timeout_secs(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TranslationProvider::default(),
            available_providers: Vec::new(),
            common: TranslationCommonConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(TranslationProvider::Ollama));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::OpenAI));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::Anthropic));

        config
    }
}
