//! Generation settings snapshot.
//!
//! The pipeline reads one [`GenerationSettings`] snapshot per run through a
//! [`SettingsProvider`]; `validated()` normalises whatever the host stored.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_HIDDEN_ASSUMPTIONS_PROMPT: &str =
    "Identify hidden assumptions, unstated premises, or implicit biases in the following text.";
pub const DEFAULT_COUNTERARGUMENT_PROMPT: &str =
    "Provide a strong, well-reasoned counterargument or alternative perspective to the following claim.";
pub const MAX_PROMPT_CHARS: usize = 1_000;
pub const MAX_CUSTOM_INSTRUCTION_CHARS: usize = 300;
pub const MIN_AI_TIMEOUT_SECONDS: f64 = 1.0;
pub const MAX_AI_TIMEOUT_SECONDS: f64 = 15.0;
pub const DEFAULT_AI_TIMEOUT_SECONDS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelOption {
    #[default]
    Default,
    CreativeWriting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    Contrarian,
    #[default]
    Socratic,
    SystemsThinking,
}

impl StylePreset {
    pub fn instruction(&self) -> &'static str {
        match self {
            StylePreset::Contrarian => {
                "Take a rigorous contrary angle. Surface weak premises and overconfidence."
            }
            StylePreset::Socratic => {
                "Use Socratic questioning to challenge assumptions and reveal gaps in reasoning."
            }
            StylePreset::SystemsThinking => {
                "Analyze second-order effects, feedback loops, and systemic tradeoffs."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StylePreset::Contrarian => "contrarian",
            StylePreset::Socratic => "socratic",
            StylePreset::SystemsThinking => "systems_thinking",
        }
    }
}

/// Settings the pipeline consults for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_hidden_assumptions_prompt")]
    pub hidden_assumptions_prompt: String,

    #[serde(default = "default_counterargument_prompt")]
    pub counterargument_prompt: String,

    #[serde(default)]
    pub selected_model: ModelOption,

    #[serde(default)]
    pub style_preset: StylePreset,

    #[serde(default)]
    pub custom_style_instructions: String,

    /// Wall-clock budget for one generation call, retries included.
    #[serde(default = "default_ai_timeout_seconds")]
    pub ai_timeout_seconds: f64,
}

fn default_hidden_assumptions_prompt() -> String {
    DEFAULT_HIDDEN_ASSUMPTIONS_PROMPT.to_string()
}

fn default_counterargument_prompt() -> String {
    DEFAULT_COUNTERARGUMENT_PROMPT.to_string()
}

fn default_ai_timeout_seconds() -> f64 {
    DEFAULT_AI_TIMEOUT_SECONDS
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            hidden_assumptions_prompt: default_hidden_assumptions_prompt(),
            counterargument_prompt: default_counterargument_prompt(),
            selected_model: ModelOption::default(),
            style_preset: StylePreset::default(),
            custom_style_instructions: String::new(),
            ai_timeout_seconds: default_ai_timeout_seconds(),
        }
    }
}

impl GenerationSettings {
    /// Normalised copy: trimmed and capped prompts, defaults for empty prompts,
    /// sanitised custom instructions, timeout clamped into `[1, 15]` seconds.
    pub fn validated(&self) -> GenerationSettings {
        let mut result = self.clone();

        result.hidden_assumptions_prompt =
            truncate_chars(result.hidden_assumptions_prompt.trim(), MAX_PROMPT_CHARS);
        result.counterargument_prompt =
            truncate_chars(result.counterargument_prompt.trim(), MAX_PROMPT_CHARS);
        if result.hidden_assumptions_prompt.is_empty() {
            result.hidden_assumptions_prompt = default_hidden_assumptions_prompt();
        }
        if result.counterargument_prompt.is_empty() {
            result.counterargument_prompt = default_counterargument_prompt();
        }

        result.custom_style_instructions = truncate_chars(
            result.custom_style_instructions.replace('\0', " ").trim(),
            MAX_CUSTOM_INSTRUCTION_CHARS,
        );

        result.ai_timeout_seconds = if result.ai_timeout_seconds.is_finite() {
            result
                .ai_timeout_seconds
                .clamp(MIN_AI_TIMEOUT_SECONDS, MAX_AI_TIMEOUT_SECONDS)
        } else {
            DEFAULT_AI_TIMEOUT_SECONDS
        };

        result
    }

    /// Timeout as a duration. Negative or non-finite values yield zero; call on a
    /// validated snapshot to get the clamped budget.
    pub fn ai_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.ai_timeout_seconds).unwrap_or(Duration::ZERO)
    }
}

/// Truncate to at most `max` characters (not bytes).
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Source of the settings snapshot taken at the start of each generation.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn snapshot(&self) -> GenerationSettings;
}

/// Fixed settings, for hosts that do not change settings at runtime.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub GenerationSettings);

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn snapshot(&self) -> GenerationSettings {
        self.0.clone()
    }
}

/// Settings shared with a host that edits them while the orchestrator runs.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<GenerationSettings>>,
}

impl SharedSettings {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut GenerationSettings),
    {
        apply(&mut self.inner.write());
    }

    pub fn get(&self) -> GenerationSettings {
        self.inner.read().clone()
    }
}

#[async_trait]
impl SettingsProvider for SharedSettings {
    async fn snapshot(&self) -> GenerationSettings {
        self.get()
    }
}
