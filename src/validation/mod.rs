/*!
 * Validation gates for candidate translations.
 *
 * This module provides the checks a candidate must clear before it is
 * written into the catalog:
 *
 * - `quality`: Heuristic rejection of garbage or degenerate output
 * - `language`: Script/keyword detection with an AI fallback
 * - `semantic`: Back-translation plus AI equivalence judgment (optional)
 */

/// Supporting evidence attached to a verdict
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    /// Dominant script or matched keyword of the candidate
    DetectedLanguage(String),
    /// The back-translated text used for the semantic judgment
    BackTranslation(String),
    /// Lexical similarity score from the fallback comparison
    Similarity(f32),
}

/// Outcome of one validation gate for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether the candidate passed this gate
    pub pass: bool,
    /// Human-readable reason, mainly for rejections
    pub reason: String,
    /// Optional supporting evidence
    pub evidence: Option<Evidence>,
}

impl Verdict {
    /// Create a passing verdict
    pub fn pass() -> Self {
        Self {
            pass: true,
            reason: String::new(),
            evidence: None,
        }
    }

    /// Create a passing verdict with evidence
    pub fn pass_with(evidence: Evidence) -> Self {
        Self {
            pass: true,
            reason: String::new(),
            evidence: Some(evidence),
        }
    }

    /// Create a failing verdict
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            pass: false,
            reason: reason.into(),
            evidence: None,
        }
    }

    /// Create a failing verdict with evidence
    pub fn fail_with(reason: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            pass: false,
            reason: reason.into(),
            evidence: Some(evidence),
        }
    }
}

pub mod language;
pub mod quality;
pub mod semantic;

pub use language::LanguageDetector;
pub use quality::QualityValidator;
pub use semantic::SemanticValidator;
