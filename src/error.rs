//! Error types for the provocation pipeline.
//!
//! `GenerationError` is the one tagged union the pipeline surfaces. Collaborator
//! errors (`CaptureError`, `BackendError`) are mapped into it exactly once, at the
//! pipeline boundary. `ApiError` covers ambient setup failures (config, logging, HTTP).

use thiserror::Error;

/// Domain errors surfaced through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum GenerationError {
    #[error("Accessibility permission denied")]
    AccessibilityPermissionDenied,

    #[error("No text selected")]
    NoSelection,

    #[error("Prompt is empty")]
    InvalidPrompt,

    #[error("Model is unavailable")]
    ModelUnavailable,

    #[error("Model is temporarily unavailable")]
    TransientModelFailure,

    #[error("Generation timed out")]
    Timeout,

    #[error("Model returned an unusable response")]
    InvalidResponse,

    #[error("Generation failed")]
    GenerationFailed,

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Only transient backend failures are worth another attempt.
    pub fn is_retriable(&self) -> bool {
        matches!(self, GenerationError::TransientModelFailure)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, GenerationError::Cancelled)
    }

    /// Stable tag used in telemetry payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::AccessibilityPermissionDenied => "permission_denied",
            GenerationError::NoSelection => "no_selection",
            GenerationError::InvalidPrompt => "invalid_prompt",
            GenerationError::ModelUnavailable => "model_unavailable",
            GenerationError::TransientModelFailure => "transient_model_failure",
            GenerationError::Timeout => "timeout",
            GenerationError::InvalidResponse => "invalid_response",
            GenerationError::GenerationFailed => "generation_failed",
            GenerationError::Cancelled => "cancelled",
        }
    }
}

/// Failures reported by a [`crate::capture::TextSource`].
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Accessibility permission denied")]
    PermissionDenied,

    #[error("No text selected")]
    NoSelection,

    #[error("Text capture timed out")]
    Timeout,

    #[error("Text capture cancelled")]
    Cancelled,

    #[error("Text capture failed: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<CaptureError> for GenerationError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => GenerationError::AccessibilityPermissionDenied,
            CaptureError::NoSelection => GenerationError::NoSelection,
            CaptureError::Timeout => GenerationError::Timeout,
            CaptureError::Cancelled => GenerationError::Cancelled,
            CaptureError::Other(_) => GenerationError::GenerationFailed,
        }
    }
}

/// Failures reported by a [`crate::generation::GenerationBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend is warming up, rate limited, or otherwise briefly unable to serve.
    #[error("Backend temporarily unavailable: {0}")]
    Transient(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Backend rejected an empty prompt")]
    InvalidPrompt,

    #[error("Backend call cancelled")]
    Cancelled,

    #[error("Backend failure: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<BackendError> for GenerationError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Transient(_) => GenerationError::TransientModelFailure,
            BackendError::ModelUnavailable(_) => GenerationError::ModelUnavailable,
            BackendError::InvalidPrompt => GenerationError::InvalidPrompt,
            BackendError::Cancelled => GenerationError::Cancelled,
            BackendError::Other(_) => GenerationError::GenerationFailed,
        }
    }
}

/// Ambient errors: configuration, logging setup, client construction.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Backend setup failed: {0}")]
    BackendSetup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
