use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryEventType {
    ToolUse,
    TaskRouting,
    Error,
    Provenance,
    Startup,
    GapDetected,
}

/// An append-only telemetry row. `id` makes redelivery idempotent:
/// re-appending an event with an id already present in the store is a
/// no-op (see `hippoforge-telemetry::TelemetryLedger::append`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub install_id: String,
    pub event_type: TelemetryEventType,
    pub tool_name: Option<String>,
    pub success: Option<bool>,
    pub duration_ms: Option<u64>,
    pub error_category: Option<String>,
    pub properties: serde_json::Value,
}

impl TelemetryEvent {
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        install_id: impl Into<String>,
        event_type: TelemetryEventType,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
            install_id: install_id.into(),
            event_type,
            tool_name: None,
            success: None,
            duration_ms: None,
            error_category: None,
            properties: serde_json::json!({}),
        }
    }
}
