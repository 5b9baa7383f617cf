/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scriptable provider that simulates backend
 * behaviors the pipeline must survive:
 * - `MockProvider::echo()` - Answers every batch with well-formed JSON
 * - `MockProvider::map()` - Answers from a fixed source→translation table
 * - `MockProvider::scripted()` - Plays back raw responses in order
 * - `MockProvider::failing()` / `timed_out()` - Transport failures
 */

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::errors::ProviderError;

/// Behavior mode for the mock provider
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Answer each input entry with `prefix + source`
    Echo {
        /// Text prepended to each source to form the "translation"
        prefix: String,
    },
    /// Answer from a fixed source → translation table; entries without a
    /// mapping are omitted from the response
    Map(HashMap<String, String>),
    /// Play back raw response strings in order, then fail
    Scripted(Vec<String>),
    /// Always fail with a connection error
    Failing,
    /// Always fail with a timeout
    TimedOut,
}

/// One input entry as embedded in the batch prompt
#[derive(Debug, Deserialize)]
struct PromptUnit {
    #[allow(dead_code)]
    index: usize,
    source: String,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Remaining scripted responses
    script: Mutex<VecDeque<String>>,
    /// Number of completed calls
    call_count: Arc<AtomicUsize>,
    /// User prompts seen, for assertions
    requests: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        let script = match &behavior {
            MockBehavior::Scripted(responses) => responses.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            behavior,
            script: Mutex::new(script),
            call_count: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that echoes each source with a marker prefix
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo {
            prefix: "~".to_string(),
        })
    }

    /// Create a mock answering from a fixed translation table
    pub fn map(entries: &[(&str, &str)]) -> Self {
        let table = entries
            .iter()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect();
        Self::new(MockBehavior::Map(table))
    }

    /// Create a mock playing back raw responses in order
    pub fn scripted(responses: Vec<String>) -> Self {
        Self::new(MockBehavior::Scripted(responses))
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that always times out
    pub fn timed_out() -> Self {
        Self::new(MockBehavior::TimedOut)
    }

    /// Number of completed calls so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// User prompts seen so far
    pub fn seen_requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Build a well-formed JSON batch response from (source, translation) pairs
    pub fn json_response(pairs: &[(&str, &str)]) -> String {
        let items: Vec<serde_json::Value> = pairs
            .iter()
            .map(|(source, translation)| {
                serde_json::json!({ "source": source, "translation": translation })
            })
            .collect();
        serde_json::to_string(&items).unwrap_or_default()
    }

    /// Complete a raw chat call against the scripted behavior
    pub async fn complete_raw(&self, _system: &str, user: &str) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(user.to_string());

        match &self.behavior {
            MockBehavior::Echo { prefix } => {
                let units = Self::units_from_prompt(user)?;
                let pairs: Vec<(String, String)> = units
                    .into_iter()
                    .map(|u| {
                        let translated = format!("{}{}", prefix, u.source);
                        (u.source, translated)
                    })
                    .collect();
                let borrowed: Vec<(&str, &str)> =
                    pairs.iter().map(|(s, t)| (s.as_str(), t.as_str())).collect();
                Ok(Self::json_response(&borrowed))
            }
            MockBehavior::Map(table) => {
                let units = Self::units_from_prompt(user)?;
                let pairs: Vec<(&str, &str)> = units
                    .iter()
                    .filter_map(|u| {
                        table
                            .get(&u.source)
                            .map(|t| (u.source.as_str(), t.as_str()))
                    })
                    .collect();
                Ok(Self::json_response(&pairs))
            }
            MockBehavior::Scripted(_) => self.script.lock().pop_front().ok_or_else(|| {
                ProviderError::RequestFailed("Mock script exhausted".to_string())
            }),
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Mock provider configured to fail".to_string(),
            )),
            MockBehavior::TimedOut => Err(ProviderError::Timeout(
                "Mock provider configured to time out".to_string(),
            )),
        }
    }

    /// Recover the input units from the batch prompt's INPUT section
    fn units_from_prompt(user: &str) -> Result<Vec<PromptUnit>, ProviderError> {
        let payload = user
            .split_once("INPUT:")
            .map(|(_, rest)| rest.trim())
            .ok_or_else(|| {
                ProviderError::ParseError("Mock could not find INPUT section".to_string())
            })?;

        serde_json::from_str(payload)
            .map_err(|e| ProviderError::ParseError(format!("Mock could not parse prompt: {}", e)))
    }
}
