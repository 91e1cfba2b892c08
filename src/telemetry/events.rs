//! Event schema for telemetry.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TRIGGER_STARTED: &str = "trigger_started";
pub const TRIGGER_DROPPED: &str = "trigger_dropped";
pub const RUN_SUPERSEDED: &str = "run_superseded";
pub const PIPELINE_STAGE: &str = "pipeline_stage";
pub const PIPELINE_COMPLETED: &str = "pipeline_completed";
pub const PIPELINE_FAILED: &str = "pipeline_failed";
pub const PIPELINE_CANCELLED: &str = "pipeline_cancelled";
pub const GENERATION_RETRYING: &str = "generation_retrying";
pub const GENERATION_COMPLETED: &str = "generation_completed";
pub const GENERATION_FAILED: &str = "generation_failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub ts: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl TelemetryEvent {
    pub fn with_now(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event_type: event_type.into(),
            data,
        }
    }

    /// Serializes a typed payload; a payload that fails to serialize becomes `null`.
    pub fn from_data<T: Serialize>(event_type: impl Into<String>, data: &T) -> Self {
        Self::with_now(
            event_type,
            serde_json::to_value(data).unwrap_or(Value::Null),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEventData {
    pub source: String,
    pub decision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regenerate_from_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEventData {
    pub run_id: u64,
    pub stage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationEventData {
    pub run_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEventData {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presented_in_panel: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEventData {
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryEventData {
    pub request_id: String,
    pub attempt: u32,
    pub delay_ms: u64,
    pub error: String,
}
