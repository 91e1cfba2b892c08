//! Telemetry domain: event schema, sinks, and an in-process bus.

pub mod bus;
pub mod events;
pub mod sink;

pub use bus::TelemetryBus;
pub use events::{
    CancellationEventData, CompletionEventData, FailureEventData, RetryEventData,
    StageEventData, TelemetryEvent, TriggerEventData,
};
pub use sink::{NoopTelemetrySink, TelemetrySink, TracingTelemetrySink};
