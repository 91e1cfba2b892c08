//! One-shot run: wire collaborators, trigger once, wait, collect the outcome.

use crate::capture::FixedTextSource;
use crate::cli::presentation::{CliOutcome, TerminalPresentationSink};
use crate::config::ProvokeConfig;
use crate::error::ApiError;
use crate::generation::{GenerationExecutor, OllamaBackend, ResponseGenerator};
use crate::orchestrator::{OrchestratorServices, TriggerDecision, TriggerOrchestrator, TriggerSource};
use crate::settings::StaticSettings;
use crate::telemetry::{TelemetrySink, TracingTelemetrySink};
use std::sync::Arc;
use tracing::info;

pub struct RunContext {
    config: ProvokeConfig,
    generator: Arc<dyn ResponseGenerator>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl RunContext {
    /// Builds the HTTP backend and executor from `config`.
    pub fn new(config: ProvokeConfig) -> Result<Self, ApiError> {
        let telemetry: Arc<dyn TelemetrySink> = Arc::new(TracingTelemetrySink);
        let backend = Arc::new(OllamaBackend::new(&config.backend)?);
        let executor =
            GenerationExecutor::new(backend, config.executor).with_telemetry(telemetry.clone());
        Ok(Self {
            config,
            generator: Arc::new(executor),
            telemetry,
        })
    }

    pub fn with_generator(config: ProvokeConfig, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            config,
            generator,
            telemetry: Arc::new(TracingTelemetrySink),
        }
    }

    pub async fn execute(&self, text: String) -> CliOutcome {
        let sink = Arc::new(TerminalPresentationSink::new());
        let orchestrator = TriggerOrchestrator::builder(OrchestratorServices {
            text_source: Arc::new(FixedTextSource::new(text)),
            generator: self.generator.clone(),
            settings: Arc::new(StaticSettings(self.config.settings.clone())),
            sink: sink.clone(),
        })
        .config(self.config.orchestrator)
        .telemetry(self.telemetry.clone())
        .build();

        let decision = orchestrator.trigger(TriggerSource::Menu, None).await;
        if decision != TriggerDecision::Started {
            return CliOutcome::Error(format!("Trigger was not started: {}", decision.as_str()));
        }
        orchestrator.wait_until_idle().await;
        info!(metrics = ?orchestrator.metrics(), "Run finished");

        sink.take_outcome()
            .unwrap_or_else(|| CliOutcome::Error("Generation was cancelled".to_string()))
    }
}
