//! Trigger orchestration: single-flight admission, debounce, and the
//! capture → compose → generate → parse → present pipeline.
//!
//! Admission (`trigger`, `cancel_current`) is serialized by an async gate held
//! across the regenerate join. Run state lives behind a short synchronous lock
//! that is never held across an await.

pub mod clock;
mod pipeline;

pub use crate::config::OrchestratorConfig;
pub use clock::{ManualClock, OrchestratorClock, SystemClock};

use crate::capture::TextSource;
use crate::generation::ResponseGenerator;
use crate::presentation::{DefaultErrorPresentationMapper, ErrorPresentationMapping, PresentationSink};
use crate::settings::SettingsProvider;
use crate::telemetry::events::{
    CancellationEventData, TriggerEventData, RUN_SUPERSEDED, TRIGGER_DROPPED, TRIGGER_STARTED,
};
use crate::telemetry::{TelemetryEvent, TelemetrySink, TracingTelemetrySink};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Hotkey,
    Menu,
    /// Supersedes an in-flight run and skips debounce
    Regenerate,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Hotkey => "hotkey",
            TriggerSource::Menu => "menu",
            TriggerSource::Regenerate => "regenerate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerDecision {
    Started,
    DroppedInFlight,
    Debounced,
}

impl TriggerDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerDecision::Started => "started",
            TriggerDecision::DroppedInFlight => "dropped_in_flight",
            TriggerDecision::Debounced => "debounced",
        }
    }
}

/// Why a run was cancelled. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    UserClosed,
    RegenerateRequested,
    AppTerminating,
    ServiceCancelled,
    TaskCancelled,
}

impl CancellationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationReason::UserClosed => "user_closed",
            CancellationReason::RegenerateRequested => "regenerate_requested",
            CancellationReason::AppTerminating => "app_terminating",
            CancellationReason::ServiceCancelled => "service_cancelled",
            CancellationReason::TaskCancelled => "task_cancelled",
        }
    }
}

/// Lifetime counters. `triggers_received` always equals
/// `triggers_started + dropped_in_flight + dropped_debounced`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorMetrics {
    pub triggers_received: u64,
    pub triggers_started: u64,
    pub dropped_in_flight: u64,
    pub dropped_debounced: u64,
    pub cancellations: u64,
}

/// Collaborators every run talks to.
#[derive(Clone)]
pub struct OrchestratorServices {
    pub text_source: Arc<dyn TextSource>,
    pub generator: Arc<dyn ResponseGenerator>,
    pub settings: Arc<dyn SettingsProvider>,
    pub sink: Arc<dyn PresentationSink>,
}

type Completion = Shared<BoxFuture<'static, ()>>;

struct InFlightRun {
    id: u64,
    cancel: CancellationToken,
    completion: Completion,
    reason: Option<CancellationReason>,
}

#[derive(Default)]
struct RunState {
    current: Option<InFlightRun>,
    last_accepted: Option<Duration>,
    metrics: OrchestratorMetrics,
    next_run_id: u64,
}

struct Inner {
    services: OrchestratorServices,
    config: OrchestratorConfig,
    clock: Arc<dyn OrchestratorClock>,
    mapper: Arc<dyn ErrorPresentationMapping>,
    telemetry: Arc<dyn TelemetrySink>,
    admission: tokio::sync::Mutex<()>,
    state: Mutex<RunState>,
}

impl Inner {
    fn emit<T: Serialize>(&self, event_type: &str, data: &T) {
        self.telemetry.emit(TelemetryEvent::from_data(event_type, data));
    }

    /// Clears the slot if it still belongs to `run_id`.
    fn release(&self, run_id: u64) {
        let mut state = self.state.lock();
        if state.current.as_ref().map(|run| run.id) == Some(run_id) {
            state.current = None;
        }
    }

    /// Counts one cancellation and returns the recorded reason, if any.
    fn record_cancellation(&self, run_id: u64) -> Option<CancellationReason> {
        let mut state = self.state.lock();
        state.metrics.cancellations += 1;
        state
            .current
            .as_ref()
            .filter(|run| run.id == run_id)
            .and_then(|run| run.reason)
    }
}

/// Single entry point for trigger events. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TriggerOrchestrator {
    inner: Arc<Inner>,
}

pub struct TriggerOrchestratorBuilder {
    services: OrchestratorServices,
    config: OrchestratorConfig,
    clock: Arc<dyn OrchestratorClock>,
    mapper: Arc<dyn ErrorPresentationMapping>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl TriggerOrchestratorBuilder {
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn OrchestratorClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn error_mapper(mut self, mapper: Arc<dyn ErrorPresentationMapping>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn build(self) -> TriggerOrchestrator {
        TriggerOrchestrator {
            inner: Arc::new(Inner {
                services: self.services,
                config: self.config,
                clock: self.clock,
                mapper: self.mapper,
                telemetry: self.telemetry,
                admission: tokio::sync::Mutex::new(()),
                state: Mutex::new(RunState::default()),
            }),
        }
    }
}

impl TriggerOrchestrator {
    pub fn builder(services: OrchestratorServices) -> TriggerOrchestratorBuilder {
        TriggerOrchestratorBuilder {
            services,
            config: OrchestratorConfig::default(),
            clock: Arc::new(SystemClock::new()),
            mapper: Arc::new(DefaultErrorPresentationMapper),
            telemetry: Arc::new(TracingTelemetrySink),
        }
    }

    pub fn new(services: OrchestratorServices) -> Self {
        Self::builder(services).build()
    }

    /// Decide whether to start a run for this trigger.
    ///
    /// A `Regenerate` trigger cancels any in-flight run and waits for it to
    /// finish before starting its own. Must be called within a tokio runtime.
    pub async fn trigger(
        &self,
        source: TriggerSource,
        regenerate_from_id: Option<Uuid>,
    ) -> TriggerDecision {
        let _admission = self.inner.admission.lock().await;

        let superseded = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            match state.current.as_mut() {
                None => None,
                Some(run) if source == TriggerSource::Regenerate => {
                    let reason = *run.reason.get_or_insert(CancellationReason::RegenerateRequested);
                    run.cancel.cancel();
                    Some((run.id, reason, run.completion.clone()))
                }
                Some(_) => {
                    state.metrics.triggers_received += 1;
                    state.metrics.dropped_in_flight += 1;
                    drop(guard);
                    self.emit_dropped(source, TriggerDecision::DroppedInFlight, "in_flight");
                    return TriggerDecision::DroppedInFlight;
                }
            }
        };

        if let Some((run_id, reason, completion)) = superseded {
            self.inner.emit(
                RUN_SUPERSEDED,
                &CancellationEventData {
                    run_id,
                    reason: reason.as_str().to_string(),
                },
            );
            completion.await;
            self.inner.release(run_id);
        }

        let now = self.inner.clock.now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        state.metrics.triggers_received += 1;

        if source != TriggerSource::Regenerate
            && is_debounced(state.last_accepted, now, self.inner.config.debounce_window())
        {
            state.metrics.dropped_debounced += 1;
            drop(guard);
            self.emit_dropped(source, TriggerDecision::Debounced, "debounced");
            return TriggerDecision::Debounced;
        }

        state.last_accepted = Some(now);
        state.metrics.triggers_started += 1;
        let run_id = state.next_run_id;
        state.next_run_id += 1;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(pipeline::supervise(
            self.inner.clone(),
            run_id,
            source,
            regenerate_from_id,
            cancel.clone(),
        ));
        let completion: Completion = async move {
            let _ = handle.await;
        }
        .boxed()
        .shared();

        state.current = Some(InFlightRun {
            id: run_id,
            cancel,
            completion,
            reason: None,
        });
        drop(guard);

        self.inner.emit(
            TRIGGER_STARTED,
            &TriggerEventData {
                source: source.as_str().to_string(),
                decision: TriggerDecision::Started.as_str().to_string(),
                run_id: Some(run_id),
                reason: None,
                regenerate_from_id: regenerate_from_id.map(|id| id.to_string()),
            },
        );
        TriggerDecision::Started
    }

    /// Cancel the in-flight run, if any, and wait for it to finish.
    ///
    /// The first recorded reason wins; cancelling a run that is already
    /// cancelling changes nothing.
    pub async fn cancel_current(&self, reason: CancellationReason) {
        let _admission = self.inner.admission.lock().await;

        let pending = {
            let mut state = self.inner.state.lock();
            match state.current.as_mut() {
                None => return,
                Some(run) => {
                    run.reason.get_or_insert(reason);
                    run.cancel.cancel();
                    (run.id, run.completion.clone())
                }
            }
        };

        let (run_id, completion) = pending;
        completion.await;
        self.inner.release(run_id);
    }

    pub fn metrics(&self) -> OrchestratorMetrics {
        self.inner.state.lock().metrics
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.state.lock().current.is_some()
    }

    /// Wait for the current run, if any, without cancelling it.
    pub async fn wait_until_idle(&self) {
        let completion = self
            .inner
            .state
            .lock()
            .current
            .as_ref()
            .map(|run| run.completion.clone());
        if let Some(completion) = completion {
            completion.await;
        }
    }

    fn emit_dropped(&self, source: TriggerSource, decision: TriggerDecision, reason: &str) {
        self.inner.emit(
            TRIGGER_DROPPED,
            &TriggerEventData {
                source: source.as_str().to_string(),
                decision: decision.as_str().to_string(),
                run_id: None,
                reason: Some(reason.to_string()),
                regenerate_from_id: None,
            },
        );
    }
}

/// `now - last < window`; a clock that went backwards never debounces.
fn is_debounced(last_accepted: Option<Duration>, now: Duration, window: Duration) -> bool {
    last_accepted
        .and_then(|last| now.checked_sub(last))
        .map_or(false, |elapsed| elapsed < window)
}
