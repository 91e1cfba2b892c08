//! Shared test utilities for integration tests
//!
//! Hand-written doubles behind the crate's public traits, plus environment
//! isolation for config tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use provoke::capture::{PermissionStatus, TextSource};
use provoke::config::ExecutorConfig;
use provoke::error::{BackendError, CaptureError};
use provoke::generation::{
    GenerationBackend, GenerationExecutor, GenerationOptions, GenerationResponse,
    ResponseGenerator,
};
use provoke::orchestrator::OrchestratorServices;
use provoke::presentation::{ErrorPresentation, PresentationSink};
use provoke::settings::{GenerationSettings, StaticSettings};
use provoke::telemetry::NoopTelemetrySink;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const TAGGED_REPLY: &str =
    "HEADLINE: Growth is not free\nBODY: The claim assumes scaling costs nothing.\nFOLLOW_UP: Who absorbs the cost?";
pub const SECOND_REPLY: &str =
    "HEADLINE: Another angle\nBODY: Consider who benefits from the framing.\nFOLLOW_UP: NONE";

// ---------------------------------------------------------------------------
// Environment isolation
// ---------------------------------------------------------------------------

/// Serializes environment mutation across all tests in this binary
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and the given
/// extra variables set; everything is restored afterwards.
pub fn with_config_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut keys: Vec<String> = vec!["HOME".to_string(), "XDG_CONFIG_HOME".to_string()];
    keys.extend(vars.iter().map(|(k, _)| k.to_string()));
    let saved: Vec<(String, Option<String>)> = keys
        .iter()
        .map(|k| (k.clone(), std::env::var(k).ok()))
        .collect();

    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(&key, v),
            None => std::env::remove_var(&key),
        }
    }

    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum StepResult {
    Reply(String),
    Transient,
    Unavailable,
    Other,
}

/// One scripted backend call: wait `delay` (cancellably), then produce `result`.
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub result: StepResult,
}

impl Step {
    pub fn reply(text: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: StepResult::Reply(text.to_string()),
        }
    }

    pub fn transient() -> Self {
        Self {
            delay: Duration::ZERO,
            result: StepResult::Transient,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            delay: Duration::ZERO,
            result: StepResult::Unavailable,
        }
    }

    pub fn other() -> Self {
        Self {
            delay: Duration::ZERO,
            result: StepResult::Other,
        }
    }

    /// A reply that only arrives after `delay`.
    pub fn hang(delay: Duration) -> Self {
        Self::reply(TAGGED_REPLY).after(delay)
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Counts calls to the backend that ended with their token cancelled,
/// including calls whose future was dropped mid-flight.
struct CancelObserver<'a> {
    token: CancellationToken,
    hits: &'a AtomicUsize,
}

impl Drop for CancelObserver<'_> {
    fn drop(&mut self) {
        if self.token.is_cancelled() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct StubBackend {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    cancellations: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new(script: Vec<Step>) -> Arc<Self> {
        Self::with_fallback(script, Step::reply(TAGGED_REPLY))
    }

    pub fn with_fallback(script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            cancellations: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
        cancel: CancellationToken,
    ) -> Result<String, BackendError> {
        let step = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        let _observer = CancelObserver {
            token: cancel.clone(),
            hits: &self.cancellations,
        };

        if !step.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(BackendError::Cancelled),
                _ = tokio::time::sleep(step.delay) => {}
            }
        }

        match step.result {
            StepResult::Reply(text) => Ok(text),
            StepResult::Transient => Err(BackendError::Transient("model warming up".to_string())),
            StepResult::Unavailable => {
                Err(BackendError::ModelUnavailable("model missing".to_string()))
            }
            StepResult::Other => Err(BackendError::Other(anyhow::anyhow!("socket closed"))),
        }
    }
}

pub fn executor(backend: Arc<StubBackend>, config: ExecutorConfig) -> Arc<GenerationExecutor> {
    Arc::new(GenerationExecutor::new(backend, config).with_telemetry(Arc::new(NoopTelemetrySink)))
}

// ---------------------------------------------------------------------------
// Text source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum CaptureScript {
    Text(String),
    NoSelection,
}

pub struct ScriptedTextSource {
    permission: PermissionStatus,
    capture: CaptureScript,
    preflight_delay: Duration,
    capture_delay: Duration,
    preflight_calls: AtomicUsize,
    capture_calls: AtomicUsize,
    capture_panics: AtomicUsize,
}

impl ScriptedTextSource {
    fn new(permission: PermissionStatus, capture: CaptureScript) -> Self {
        Self {
            permission,
            capture,
            preflight_delay: Duration::ZERO,
            capture_delay: Duration::ZERO,
            preflight_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
            capture_panics: AtomicUsize::new(0),
        }
    }

    pub fn granted(text: &str) -> Self {
        Self::new(PermissionStatus::Granted, CaptureScript::Text(text.to_string()))
    }

    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied, CaptureScript::NoSelection)
    }

    pub fn no_selection() -> Self {
        Self::new(PermissionStatus::Granted, CaptureScript::NoSelection)
    }

    pub fn with_preflight_delay(mut self, delay: Duration) -> Self {
        self.preflight_delay = delay;
        self
    }

    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    /// The next `count` captures panic instead of returning.
    pub fn with_capture_panics(self, count: usize) -> Self {
        self.capture_panics.store(count, Ordering::SeqCst);
        self
    }

    pub fn preflight_calls(&self) -> usize {
        self.preflight_calls.load(Ordering::SeqCst)
    }

    pub fn capture_calls(&self) -> usize {
        self.capture_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextSource for ScriptedTextSource {
    async fn preflight(&self) -> PermissionStatus {
        self.preflight_calls.fetch_add(1, Ordering::SeqCst);
        if !self.preflight_delay.is_zero() {
            tokio::time::sleep(self.preflight_delay).await;
        }
        self.permission
    }

    async fn capture(&self, cancel: CancellationToken) -> Result<String, CaptureError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .capture_panics
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            panic!("accessibility bridge crashed");
        }
        if !self.capture_delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CaptureError::Cancelled),
                _ = tokio::time::sleep(self.capture_delay) => {}
            }
        }
        match &self.capture {
            CaptureScript::Text(text) => Ok(text.clone()),
            CaptureScript::NoSelection => Err(CaptureError::NoSelection),
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum SinkEvent {
    Generating(bool),
    Loading(Option<String>),
    Response(GenerationResponse),
    Error(ErrorPresentation),
    Background(String),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    panel_visible: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_panel_visible(visible: bool) -> Arc<Self> {
        let sink = Self::default();
        sink.panel_visible.store(visible, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    pub fn generating(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Generating(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn loading(&self) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Loading(preview) => Some(preview),
                _ => None,
            })
            .collect()
    }

    pub fn responses(&self) -> Vec<GenerationResponse> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Response(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ErrorPresentation> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Error(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn backgrounds(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Background(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SinkEvent) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl PresentationSink for RecordingSink {
    async fn set_generating(&self, generating: bool) {
        self.record(SinkEvent::Generating(generating));
    }

    async fn show_loading(&self, preview: Option<String>) {
        self.record(SinkEvent::Loading(preview));
    }

    async fn show_response(&self, response: GenerationResponse) {
        self.record(SinkEvent::Response(response));
    }

    async fn show_error(&self, presentation: ErrorPresentation) {
        self.record(SinkEvent::Error(presentation));
    }

    async fn is_panel_visible(&self) -> bool {
        self.panel_visible.load(Ordering::SeqCst)
    }

    async fn notify_background(&self, message: String) {
        self.record(SinkEvent::Background(message));
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub fn services(
    text_source: Arc<dyn TextSource>,
    generator: Arc<dyn ResponseGenerator>,
    settings: GenerationSettings,
    sink: Arc<RecordingSink>,
) -> OrchestratorServices {
    OrchestratorServices {
        text_source,
        generator,
        settings: Arc::new(StaticSettings(settings)),
        sink,
    }
}

/// Poll `condition` on 1ms ticks of (possibly paused) runtime time.
pub async fn wait_for<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
