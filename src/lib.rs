//! Provoke: single-flight provocation generation
//!
//! Accepts trigger events from several sources, runs at most one
//! capture → compose → generate → parse → present pipeline at a time, debounces
//! bursts, and cancels superseded work cooperatively. Generation against the
//! slow backend is wrapped in bounded retry and a wall-clock timeout race.

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod orchestrator;
pub mod parser;
pub mod presentation;
pub mod prompt;
pub mod settings;
pub mod telemetry;

pub use error::{ApiError, BackendError, CaptureError, GenerationError};
pub use orchestrator::{
    CancellationReason, OrchestratorMetrics, OrchestratorServices, TriggerDecision,
    TriggerOrchestrator, TriggerSource,
};
