//! Text source seam: where the selected text comes from.

use crate::error::CaptureError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

#[async_trait]
pub trait TextSource: Send + Sync {
    /// Permission check run before every capture.
    async fn preflight(&self) -> PermissionStatus;

    /// Capture the current selection. Must return promptly once `cancel` fires.
    async fn capture(&self, cancel: CancellationToken) -> Result<String, CaptureError>;
}

/// Text handed over by the host up front, e.g. from the command line.
#[derive(Debug, Clone)]
pub struct FixedTextSource {
    text: String,
}

impl FixedTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl TextSource for FixedTextSource {
    async fn preflight(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn capture(&self, cancel: CancellationToken) -> Result<String, CaptureError> {
        if cancel.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }
        if self.text.trim().is_empty() {
            return Err(CaptureError::NoSelection);
        }
        Ok(self.text.clone())
    }
}
