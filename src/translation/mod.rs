/*!
 * Translation pipeline for catalog completion using AI providers.
 *
 * This module contains the core functionality for translating pending
 * catalog entries. It is split into several submodules:
 *
 * - `core`: Core translation service and provider dispatch
 * - `batch`: Per-file batch pipeline (extract, dispatch, validate, persist)
 * - `response`: Staged recovery of malformed backend payloads
 * - `reconcile`: Response-to-request realignment
 * - `rate_limit`: Shared sliding-window call limiter
 * - `prompts`: Prompt templates for translation and judging
 * - `cache`: In-memory cache of accepted translations
 */

// Re-export main types for easier usage
pub use self::batch::{BatchTranslator, FileReport};
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::rate_limit::RateLimiter;
pub use self::reconcile::{Mapping, MappingReason};
pub use self::response::{ParseOutcome, ResponseItem};

// Submodules
pub mod batch;
pub mod cache;
pub mod core;
pub mod prompts;
pub mod rate_limit;
pub mod reconcile;
pub mod response;
