//! Generation executor: one logical generation wrapped in bounded retry and a
//! wall-clock timeout race.
//!
//! The timeout covers the whole retry loop, backoff sleeps included. Whichever of
//! the operation, the timer, or outside cancellation finishes first decides the
//! outcome; the operation's token is cancelled before the losing future is dropped,
//! so the backend always observes the stop.

use crate::config::ExecutorConfig;
use crate::error::GenerationError;
use crate::generation::backend::{GenerationBackend, GenerationOptions};
use crate::generation::request::GenerationRequest;
use crate::generation::response::{GenerationContent, GenerationOutcome, GenerationResponse};
use crate::parser::{DefaultResponseParser, ResponseParser};
use crate::prompt::{DefaultPromptComposer, PromptComposer};
use crate::settings::GenerationSettings;
use crate::telemetry::events::{
    CompletionEventData, FailureEventData, RetryEventData, GENERATION_COMPLETED,
    GENERATION_FAILED, GENERATION_RETRYING,
};
use crate::telemetry::{TelemetryEvent, TelemetrySink, TracingTelemetrySink};
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Produces a response for a request. Never fails: errors are carried in the
/// response outcome, and outside cancellation yields [`GenerationError::Cancelled`].
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
        settings: &GenerationSettings,
        cancel: CancellationToken,
    ) -> GenerationResponse;
}

pub struct GenerationExecutor {
    backend: Arc<dyn GenerationBackend>,
    composer: Arc<dyn PromptComposer>,
    parser: Arc<dyn ResponseParser>,
    config: ExecutorConfig,
    options: GenerationOptions,
    telemetry: Arc<dyn TelemetrySink>,
}

impl GenerationExecutor {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: ExecutorConfig) -> Self {
        Self {
            backend,
            composer: Arc::new(DefaultPromptComposer),
            parser: Arc::new(DefaultResponseParser),
            config,
            options: GenerationOptions::default(),
            telemetry: Arc::new(TracingTelemetrySink),
        }
    }

    pub fn with_composer(mut self, composer: Arc<dyn PromptComposer>) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// `model` is always taken from the settings snapshot; only the other
    /// fields of `options` are used.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        settings: &GenerationSettings,
        cancel: &CancellationToken,
        attempts: &AtomicU32,
    ) -> Result<GenerationContent, GenerationError> {
        let prompt = self.composer.compose(request, settings);
        if prompt.trim().is_empty() {
            return Err(GenerationError::InvalidPrompt);
        }

        let options = GenerationOptions {
            model: settings.selected_model,
            ..self.options
        };
        let request_id = request.id.to_string();

        let raw = race_timeout(settings.ai_timeout(), cancel, |race| {
            self.generate_with_retry(&request_id, &prompt, &options, race, attempts)
        })
        .await?;

        self.parser.parse(&raw)
    }

    async fn generate_with_retry(
        &self,
        request_id: &str,
        prompt: &str,
        options: &GenerationOptions,
        cancel: CancellationToken,
        attempts: &AtomicU32,
    ) -> Result<String, GenerationError> {
        let mut retries = 0u32;
        loop {
            attempts.fetch_add(1, Ordering::SeqCst);
            let error = match self.backend.generate(prompt, options, cancel.clone()).await {
                Ok(raw) => return Ok(raw),
                Err(_) if cancel.is_cancelled() => GenerationError::Cancelled,
                Err(err) => GenerationError::from(err),
            };

            if !error.is_retriable() || retries >= self.config.max_retries {
                return Err(error);
            }

            retries += 1;
            let delay = self.config.backoff_for_attempt(retries);
            self.telemetry.emit(TelemetryEvent::from_data(
                GENERATION_RETRYING,
                &RetryEventData {
                    request_id: request_id.to_string(),
                    attempt: retries,
                    delay_ms: millis(delay),
                    error: error.kind().to_string(),
                },
            ));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[async_trait]
impl ResponseGenerator for GenerationExecutor {
    async fn generate(
        &self,
        request: &GenerationRequest,
        settings: &GenerationSettings,
        cancel: CancellationToken,
    ) -> GenerationResponse {
        let started = Instant::now();
        let settings = settings.validated();
        let attempts = AtomicU32::new(0);

        let result = self.run(request, &settings, &cancel, &attempts).await;
        let elapsed = started.elapsed();
        let attempts = attempts.load(Ordering::SeqCst);

        let outcome = match result {
            Ok(content) => {
                self.telemetry.emit(TelemetryEvent::from_data(
                    GENERATION_COMPLETED,
                    &CompletionEventData {
                        duration_ms: millis(elapsed),
                        run_id: None,
                        request_id: Some(request.id.to_string()),
                        attempts: Some(attempts),
                    },
                ));
                GenerationOutcome::Success(content)
            }
            Err(error) => {
                self.telemetry.emit(TelemetryEvent::from_data(
                    GENERATION_FAILED,
                    &FailureEventData {
                        error: error.kind().to_string(),
                        run_id: None,
                        request_id: Some(request.id.to_string()),
                        attempts: Some(attempts),
                        presented_in_panel: None,
                    },
                ));
                GenerationOutcome::Failure(error)
            }
        };

        GenerationResponse::new(request, settings.style_preset, outcome, elapsed)
    }
}

/// Races `operation` against `timeout` and outside cancellation.
///
/// `operation` receives a child of `cancel`, which is cancelled before the
/// operation future is dropped whatever the winner.
async fn race_timeout<F, Fut>(
    timeout: Duration,
    cancel: &CancellationToken,
    operation: F,
) -> Result<String, GenerationError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<String, GenerationError>>,
{
    let race = cancel.child_token();
    let operation = operation(race.clone());
    tokio::pin!(operation);

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenerationError::Cancelled),
        result = &mut operation => result,
        _ = tokio::time::sleep(timeout) => Err(GenerationError::Timeout),
    };

    race.cancel();
    result
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
