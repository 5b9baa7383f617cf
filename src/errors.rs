/*!
 * Error types for the lingofill application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when the request exceeded its deadline
    #[error("API request timed out: {0}")]
    Timeout(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the failure was transport-level (timeout or unreachable host)
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout(_) | ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_)
        )
    }
}

/// Errors that can occur while reading or writing a message catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog file could not be opened
    #[error("Failed to open catalog: {0}")]
    Open(String),

    /// The catalog content is not a valid TS document
    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    /// The catalog could not be written back to disk
    #[error("Failed to write catalog: {0}")]
    Write(String),
}

/// Errors raised by the translation pipeline gates.
///
/// Each variant marks a batch or a single unit as failed; none of them
/// aborts the file or the run. Units affected by these errors stay pending
/// and are retried on a future run.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Transport failure talking to the backend; the batch is dropped
    #[error("Network error: {0}")]
    Network(#[from] ProviderError),

    /// Backend payload was malformed beyond all recovery stages
    #[error("Unparseable backend response: {0}")]
    Parse(String),

    /// A response item could not be uniquely mapped back to its request
    #[error("Alignment failure: {0}")]
    Alignment(String),

    /// The candidate translation failed a quality heuristic
    #[error("Quality check failed: {0}")]
    Quality(String),

    /// The candidate does not appear to be in the target language
    #[error("Language check failed: {0}")]
    Language(String),

    /// The candidate failed semantic equivalence validation
    #[error("Semantic check failed: {0}")]
    Semantic(String),

    /// The mutated catalog could not be persisted
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from catalog processing
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
