//! Generation backend seam and the Ollama HTTP implementation.

use crate::config::BackendConfig;
use crate::error::{ApiError, BackendError};
use crate::settings::{truncate_chars, ModelOption};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options passed with every backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    pub model: ModelOption,
    /// Raw output is cut to this many characters before parsing
    pub max_output_chars: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: ModelOption::Default,
            max_output_chars: 1_200,
        }
    }
}

/// An opaque, slow, cancellable text generator.
///
/// Implementations must return promptly once `cancel` fires; [`BackendError::Transient`]
/// marks failures worth retrying.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        cancel: CancellationToken,
    ) -> Result<String, BackendError>;
}

const BACKEND_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

/// Backend talking to an Ollama server's `/api/generate` endpoint.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    creative_model: Option<String>,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(BACKEND_HTTP_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::BackendSetup(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            creative_model: config.creative_model.clone(),
        })
    }

    fn resolve_model(&self, option: ModelOption) -> &str {
        match option {
            ModelOption::Default => &self.model,
            ModelOption::CreativeWriting => self.creative_model.as_deref().unwrap_or(&self.model),
        }
    }

    async fn send(&self, prompt: &str, options: &GenerationOptions) -> Result<String, BackendError> {
        let request = OllamaGenerateRequest {
            model: self.resolve_model(options.model),
            prompt,
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, &error_text));
        }

        let body: OllamaGenerateResponse = response.json().await.map_err(|e| {
            BackendError::Other(anyhow::anyhow!("Failed to parse response: {}", e))
        })?;

        finalize_output(&body.response, options.max_output_chars)
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        cancel: CancellationToken,
    ) -> Result<String, BackendError> {
        if prompt.trim().is_empty() {
            return Err(BackendError::InvalidPrompt);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BackendError::Cancelled),
            result = self.send(prompt, options) => result,
        }
    }
}

fn map_http_error(error: reqwest::Error) -> BackendError {
    if let Some(status) = error.status() {
        map_status(status, &error.to_string())
    } else if error.is_timeout() {
        BackendError::Transient(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        BackendError::ModelUnavailable(format!("Connection error: {}", error))
    } else {
        BackendError::Other(anyhow::anyhow!("HTTP error: {}", error))
    }
}

fn map_status(status: StatusCode, detail: &str) -> BackendError {
    match status.as_u16() {
        429 | 503 => BackendError::Transient(format!("Status {}: {}", status, detail)),
        404 => BackendError::ModelUnavailable(format!("Model not found: {}", detail)),
        _ => BackendError::Other(anyhow::anyhow!(
            "Request failed with status {}: {}",
            status,
            detail
        )),
    }
}

fn finalize_output(raw: &str, max_chars: usize) -> Result<String, BackendError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BackendError::Other(anyhow::anyhow!("Backend returned empty output")));
    }
    Ok(truncate_chars(trimmed, max_chars))
}
