//! CLI parse: clap types for provoke. No behavior beyond config overrides.

use crate::config::{ConfigLoader, ProvokeConfig};
use crate::error::ApiError;
use crate::generation::GenerationKind;
use clap::Parser;
use std::path::PathBuf;

/// Provoke - challenge a piece of text with a generated counterpoint
#[derive(Parser, Debug)]
#[command(name = "provoke")]
#[command(about = "Generate a critical-thinking provocation for a piece of text")]
pub struct Cli {
    /// Text to provoke about (read from stdin when omitted)
    #[arg(long)]
    pub text: Option<String>,

    /// Provocation kind (hidden_assumptions, counterargument, custom)
    #[arg(long)]
    pub kind: Option<GenerationKind>,

    /// Configuration file path, layered over the global config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend endpoint, e.g. http://localhost:11434
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Backend model name
    #[arg(long)]
    pub model: Option<String>,

    /// Generation timeout in seconds (clamped to 1..=15)
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Layered configuration with the flags applied, validated once at the end.
    pub fn resolve_config(&self) -> Result<ProvokeConfig, ApiError> {
        let mut config = ConfigLoader::load_unvalidated(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        ConfigLoader::validated(config)
    }

    /// Command-line flags win over every config source.
    pub fn apply_overrides(&self, config: &mut ProvokeConfig) {
        if let Some(kind) = self.kind {
            config.orchestrator.kind = kind;
        }
        if let Some(endpoint) = &self.endpoint {
            config.backend.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.backend.model = model.clone();
        }
        if let Some(timeout) = self.timeout {
            config.settings.ai_timeout_seconds = timeout;
        }
    }
}
