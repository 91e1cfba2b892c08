//! Terminal presentation: collects the single outcome of a one-shot run.

use crate::generation::GenerationResponse;
use crate::presentation::{ErrorPresentation, PresentationSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum CliOutcome {
    Response(GenerationResponse),
    Error(String),
}

/// Sink for a terminal host; the panel is always "visible".
#[derive(Debug, Default)]
pub struct TerminalPresentationSink {
    outcome: Mutex<Option<CliOutcome>>,
}

impl TerminalPresentationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_outcome(&self) -> Option<CliOutcome> {
        self.outcome.lock().take()
    }
}

#[async_trait]
impl PresentationSink for TerminalPresentationSink {
    async fn set_generating(&self, generating: bool) {
        debug!(generating, "Generation state changed");
    }

    async fn show_loading(&self, preview: Option<String>) {
        info!(
            preview_chars = preview.as_ref().map(|p| p.chars().count()).unwrap_or(0),
            "Generating provocation"
        );
    }

    async fn show_response(&self, response: GenerationResponse) {
        *self.outcome.lock() = Some(CliOutcome::Response(response));
    }

    async fn show_error(&self, presentation: ErrorPresentation) {
        *self.outcome.lock() = Some(CliOutcome::Error(presentation.message));
    }

    async fn is_panel_visible(&self) -> bool {
        true
    }

    async fn notify_background(&self, message: String) {
        *self.outcome.lock() = Some(CliOutcome::Error(message));
    }
}

/// Headline, body, and follow-up question separated by blank lines.
pub fn render_response(response: &GenerationResponse) -> String {
    match response.content() {
        Some(content) => {
            let mut out = format!("{}\n\n{}", content.headline, content.body);
            if let Some(question) = &content.follow_up_question {
                out.push_str("\n\n");
                out.push_str(question);
            }
            out
        }
        None => response
            .error()
            .map(|e| e.to_string())
            .unwrap_or_default(),
    }
}
