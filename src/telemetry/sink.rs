//! Telemetry sinks. Emission is best effort and never fails the caller.

use crate::telemetry::events::{
    TelemetryEvent, GENERATION_FAILED, GENERATION_RETRYING, PIPELINE_FAILED,
};
use tracing::{debug, info, warn};

pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// Forwards events to `tracing` under the `provoke::telemetry` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        let event_type = event.event_type.as_str();
        match event_type {
            PIPELINE_FAILED | GENERATION_FAILED => warn!(
                target: "provoke::telemetry",
                event_type,
                data = %event.data,
                "telemetry event"
            ),
            GENERATION_RETRYING => info!(
                target: "provoke::telemetry",
                event_type,
                data = %event.data,
                "telemetry event"
            ),
            _ => debug!(
                target: "provoke::telemetry",
                event_type,
                data = %event.data,
                "telemetry event"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn emit(&self, _event: TelemetryEvent) {}
}
