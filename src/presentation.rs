//! Presentation seam and the mapping from domain errors to user-facing messages.

use crate::error::GenerationError;
use crate::generation::GenerationResponse;
use crate::orchestrator::TriggerSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Host-side callbacks. The pipeline only branches on `is_panel_visible`.
#[async_trait]
pub trait PresentationSink: Send + Sync {
    async fn set_generating(&self, generating: bool);
    async fn show_loading(&self, preview: Option<String>);
    async fn show_response(&self, response: GenerationResponse);
    async fn show_error(&self, presentation: ErrorPresentation);
    async fn is_panel_visible(&self) -> bool;
    async fn notify_background(&self, message: String);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresentationSink;

#[async_trait]
impl PresentationSink for NoopPresentationSink {
    async fn set_generating(&self, _generating: bool) {}
    async fn show_loading(&self, _preview: Option<String>) {}
    async fn show_response(&self, _response: GenerationResponse) {}
    async fn show_error(&self, _presentation: ErrorPresentation) {}
    async fn is_panel_visible(&self) -> bool {
        false
    }
    async fn notify_background(&self, _message: String) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPresentationAction {
    Retry,
    OpenAccessibilitySettings,
    OpenSettings,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPresentation {
    pub message: String,
    pub action: ErrorPresentationAction,
    /// Show in the panel even when it is hidden, instead of a background notice
    pub prefer_panel: bool,
}

impl ErrorPresentation {
    fn new(message: &str, action: ErrorPresentationAction, prefer_panel: bool) -> Self {
        Self {
            message: message.to_string(),
            action,
            prefer_panel,
        }
    }
}

pub trait ErrorPresentationMapping: Send + Sync {
    fn map(&self, error: GenerationError, source: TriggerSource) -> ErrorPresentation;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorPresentationMapper;

impl ErrorPresentationMapping for DefaultErrorPresentationMapper {
    fn map(&self, error: GenerationError, source: TriggerSource) -> ErrorPresentation {
        use ErrorPresentationAction::*;

        match error {
            GenerationError::AccessibilityPermissionDenied => ErrorPresentation::new(
                "Accessibility access is required to read the selected text. Grant it in system settings, then try again.",
                OpenAccessibilitySettings,
                true,
            ),
            GenerationError::NoSelection => ErrorPresentation::new(
                "Select some text in the active app, then trigger again.",
                Retry,
                true,
            ),
            GenerationError::Timeout => ErrorPresentation::new(
                "Generation took too long. Try again.",
                Retry,
                source != TriggerSource::Hotkey,
            ),
            GenerationError::TransientModelFailure => ErrorPresentation::new(
                "The model is warming up. Try again in a moment.",
                Retry,
                false,
            ),
            GenerationError::ModelUnavailable => ErrorPresentation::new(
                "The model is not available. Open settings to review model options.",
                OpenSettings,
                true,
            ),
            GenerationError::GenerationFailed
            | GenerationError::InvalidPrompt
            | GenerationError::InvalidResponse => ErrorPresentation::new(
                "Could not generate a provocation. Try again.",
                Retry,
                true,
            ),
            GenerationError::Cancelled => {
                ErrorPresentation::new("Generation cancelled.", None, false)
            }
        }
    }
}
