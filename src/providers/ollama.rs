/*!
 * Ollama API client for local LLM inference.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::{error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{retry_delay, Provider};

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the Ollama server
    base_url: String,
    /// Maximum number of retries for transient failures
    max_retries: u32,
    /// Base backoff in milliseconds, doubled on each retry
    backoff_base_ms: u64,
}

/// Generation request for the Ollama API
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// The model to use
    model: String,

    /// The prompt to complete
    prompt: String,

    /// System prompt to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,

    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    /// The model that generated the response
    #[serde(default)]
    pub model: String,

    /// The generated text
    #[serde(default)]
    pub response: String,

    /// Whether generation has finished
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
        });
        self
    }
}

impl Ollama {
    /// Create a new Ollama client
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self::new_with_config(endpoint, timeout_secs, 3, 1000)
    }

    /// Create a new Ollama client with retry configuration
    pub fn new_with_config(
        endpoint: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        let endpoint = endpoint.into();
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", endpoint.trim_end_matches('/'))
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                // Ollama serves HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url,
            max_retries,
            backoff_base_ms,
        }
    }

    /// Generate text with retry on transient failures
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let mut attempt = 0;
        loop {
            match self.generate_once(&url, &request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries && e.is_network() => {
                    let delay = retry_delay(attempt, self.backoff_base_ms);
                    warn!(
                        "Ollama request failed ({}), retrying in {:?} (attempt {}/{})",
                        e, delay, attempt + 1, self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn generate_once(
        &self,
        url: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read response body: {}", e)))?;

        match serde_json::from_str::<GenerationResponse>(&response_text) {
            Ok(parsed) => Ok(parsed),
            // Some server versions answer in JSONL even with stream=false;
            // concatenate the line fragments instead of failing.
            Err(_) => Self::assemble_from_jsonl(&response_text).ok_or_else(|| {
                let head: String = response_text.chars().take(200).collect();
                ProviderError::ParseError(format!("Unrecognized Ollama response: {}", head))
            }),
        }
    }

    /// Assemble a response from a JSONL streaming payload
    fn assemble_from_jsonl(response_text: &str) -> Option<GenerationResponse> {
        let mut full_response = String::new();
        let mut model = String::new();
        let mut saw_done = false;

        for line in response_text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(line).ok()?;
            if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
                full_response.push_str(part);
            }
            if let Some(m) = value.get("model").and_then(|v| v.as_str()) {
                model = m.to_string();
            }
            if value.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
                saw_done = true;
            }
        }

        if full_response.is_empty() && !saw_done {
            return None;
        }

        Some(GenerationResponse {
            model,
            response: full_response,
            done: saw_done,
        })
    }

    /// Query the server version, used as a connectivity probe
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await.map_err(map_transport_error)?;

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Bad version response: {}", e)))?;

        Ok(value
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string())
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.generate(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.response.clone()
    }
}

/// Map a reqwest transport failure onto the provider error taxonomy
pub(crate) fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else if e.is_connect() {
        ProviderError::ConnectionError(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}
