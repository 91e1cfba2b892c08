//! Generation response and the structured content it carries.

use crate::error::GenerationError;
use crate::generation::request::{GenerationKind, GenerationRequest, MAX_SELECTED_TEXT_CHARS};
use crate::settings::{truncate_chars, StylePreset};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

pub const MAX_HEADLINE_CHARS: usize = 100;
pub const MAX_BODY_CHARS: usize = 420;
pub const MAX_FOLLOW_UP_CHARS: usize = 140;

/// Parsed provocation, normalised to the display caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContent {
    pub headline: String,
    pub body: String,
    pub follow_up_question: Option<String>,
}

impl GenerationContent {
    pub fn new(headline: &str, body: &str, follow_up_question: Option<&str>) -> Self {
        let follow_up_question = follow_up_question
            .map(|q| truncate_chars(q.trim(), MAX_FOLLOW_UP_CHARS))
            .filter(|q| !q.is_empty());

        Self {
            headline: truncate_chars(headline.trim(), MAX_HEADLINE_CHARS),
            body: truncate_chars(body.trim(), MAX_BODY_CHARS),
            follow_up_question,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(GenerationContent),
    Failure(GenerationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub original_text: String,
    pub kind: GenerationKind,
    pub style_used: StylePreset,
    pub outcome: GenerationOutcome,
    pub generation_time: Duration,
    pub timestamp: DateTime<Utc>,
}

impl GenerationResponse {
    pub fn new(
        request: &GenerationRequest,
        style_used: StylePreset,
        outcome: GenerationOutcome,
        generation_time: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: request.id,
            original_text: truncate_chars(&request.selected_text, MAX_SELECTED_TEXT_CHARS),
            kind: request.kind,
            style_used,
            outcome,
            generation_time,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, GenerationOutcome::Success(_))
    }

    pub fn content(&self) -> Option<&GenerationContent> {
        match &self.outcome {
            GenerationOutcome::Success(content) => Some(content),
            GenerationOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<GenerationError> {
        match &self.outcome {
            GenerationOutcome::Success(_) => None,
            GenerationOutcome::Failure(error) => Some(*error),
        }
    }
}
