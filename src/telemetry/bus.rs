//! In-process event bus for telemetry events.

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::telemetry::events::TelemetryEvent;
use crate::telemetry::sink::TelemetrySink;

/// Sink half of a channel; events are dropped once the receiver is gone.
#[derive(Clone)]
pub struct TelemetryBus {
    sender: Sender<TelemetryEvent>,
}

impl TelemetryBus {
    pub fn new_pair() -> (Self, Receiver<TelemetryEvent>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }
}

impl TelemetrySink for TelemetryBus {
    fn emit(&self, event: TelemetryEvent) {
        let _ = self.sender.send(event);
    }
}
