//! Generation request: what to provoke about, and on which text.

use crate::settings::truncate_chars;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_SELECTED_TEXT_CHARS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    #[default]
    #[serde(alias = "hidden-assumptions")]
    HiddenAssumptions,
    Counterargument,
    Custom,
}

impl GenerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::HiddenAssumptions => "hidden_assumptions",
            GenerationKind::Counterargument => "counterargument",
            GenerationKind::Custom => "custom",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "hidden_assumptions" => Ok(GenerationKind::HiddenAssumptions),
            "counterargument" => Ok(GenerationKind::Counterargument),
            "custom" => Ok(GenerationKind::Custom),
            other => Err(format!(
                "Unknown generation kind '{}' (expected hidden_assumptions, counterargument, or custom)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    #[error("Selected text is empty")]
    EmptySelectedText,
}

/// One accepted trigger's input, built after capture succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub selected_text: String,
    pub kind: GenerationKind,
    pub created_at: DateTime<Utc>,
    /// Response this request asks to replace with a different angle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regenerate_from_id: Option<Uuid>,
}

impl GenerationRequest {
    /// Trims and caps `selected_text` at [`MAX_SELECTED_TEXT_CHARS`] characters.
    pub fn new(
        selected_text: &str,
        kind: GenerationKind,
        regenerate_from_id: Option<Uuid>,
    ) -> Result<Self, RequestValidationError> {
        let trimmed = selected_text.trim();
        if trimmed.is_empty() {
            return Err(RequestValidationError::EmptySelectedText);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            selected_text: truncate_chars(trimmed, MAX_SELECTED_TEXT_CHARS),
            kind,
            created_at: Utc::now(),
            regenerate_from_id,
        })
    }

    pub fn is_regeneration(&self) -> bool {
        self.regenerate_from_id.is_some()
    }
}
