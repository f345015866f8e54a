//! Destinations for composed log events

use super::event::{LogEvent, Severity};
use serde_json::Value as Json;
use std::sync::{Mutex, PoisonError};

/// Receives every event the exchange logger emits.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: &LogEvent);
}

/// Forwards events to `tracing`.
///
/// Correlation ids become their own fields; headers, body and extra are
/// rendered as JSON. `fatal` and `panic` events are emitted at error level
/// with their severity attached; nothing aborts the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: &LogEvent) {
        let mut rest = event.fields.clone();
        let log_id = rest
            .remove("log_id")
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        let trace_id = rest.remove("trace_id").and_then(|v| v.as_u64());
        let span_id = rest.remove("span_id").and_then(|v| v.as_u64());
        let fields = Json::Object(rest);
        let severity = event.severity.as_str();
        let message = event.message.as_str();

        match event.severity {
            Severity::Debug => tracing::debug!(
                log_id = %log_id, trace_id, span_id, fields = %fields, "{}", message
            ),
            Severity::Info => tracing::info!(
                log_id = %log_id, trace_id, span_id, fields = %fields, "{}", message
            ),
            Severity::Warn => tracing::warn!(
                log_id = %log_id, trace_id, span_id, fields = %fields, "{}", message
            ),
            Severity::Error | Severity::Fatal | Severity::Panic => tracing::error!(
                log_id = %log_id,
                trace_id,
                span_id,
                severity = %severity,
                fields = %fields,
                "{}",
                message
            ),
        }
    }
}

/// Keeps events in memory, for tests and embedders that ship logs
/// themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<LogEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<LogEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// First event whose message starts with `prefix`.
    pub fn find(&self, prefix: &str) -> Option<LogEvent> {
        self.lock()
            .iter()
            .find(|e| e.message.starts_with(prefix))
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for MemorySink {
    fn emit(&self, event: &LogEvent) {
        self.lock().push(event.clone());
    }
}
