//! Lowest-precedence layer: the values every other source overrides.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("orchestrator.debounce_ms", 300_i64)?
        .set_default("orchestrator.kind", "hidden_assumptions")?
        .set_default("executor.max_retries", 2_i64)?
        .set_default("executor.backoff_ms", 150_i64)?
        .set_default("backend.endpoint", "http://localhost:11434")?
        .set_default("backend.model", "llama3.2")?
        .set_default("settings.ai_timeout_seconds", 5.0_f64)
}
