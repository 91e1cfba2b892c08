//! Configuration System
//!
//! Layered configuration for the provocation pipeline: merge-policy defaults,
//! the user's global config file, an optional explicit file, and `PROVOKE__*`
//! environment overrides, in increasing precedence.

use crate::error::ApiError;
use crate::generation::GenerationKind;
use crate::logging::LoggingConfig;
use crate::settings::GenerationSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvokeConfig {
    /// Settings snapshot used when the host has no settings store of its own
    #[serde(default)]
    pub settings: GenerationSettings,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Admission behaviour of the trigger orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Minimum gap between accepted non-regenerate triggers
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Kind of provocation every run requests
    #[serde(default)]
    pub kind: GenerationKind,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            kind: GenerationKind::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Retry policy of the generation executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Retries after the first attempt; total attempts are `max_retries + 1`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff unit; the n-th retry waits `backoff_ms * n`
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    150
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl ExecutorConfig {
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// HTTP model backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Model used when the settings select the creative-writing option
    #[serde(default)]
    pub creative_model: Option<String>,

    /// Transport-level timeout for one HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            creative_model: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(creative) = &self.creative_model {
            if creative.trim().is_empty() {
                return Err("Creative model name cannot be empty when set".to_string());
            }
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!(
                "Endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be at least one second".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Orchestrator(String),
    Executor(String),
    Backend(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Orchestrator(msg) => write!(f, "Orchestrator: {}", msg),
            ValidationError::Executor(msg) => write!(f, "Executor: {}", msg),
            ValidationError::Backend(msg) => write!(f, "Backend: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

const MAX_DEBOUNCE_MS: u64 = 10_000;
const MAX_RETRIES_LIMIT: u32 = 10;

impl ProvokeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.orchestrator.debounce_ms > MAX_DEBOUNCE_MS {
            errors.push(ValidationError::Orchestrator(format!(
                "debounce_ms must be at most {}, got {}",
                MAX_DEBOUNCE_MS, self.orchestrator.debounce_ms
            )));
        }

        if self.executor.max_retries > MAX_RETRIES_LIMIT {
            errors.push(ValidationError::Executor(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES_LIMIT, self.executor.max_retries
            )));
        }

        if let Err(e) = self.backend.validate() {
            errors.push(ValidationError::Backend(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render the effective configuration in the same format the loader reads.
    pub fn to_toml_string(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}
