//! Correlation identifiers shared by every event of one logical operation

use super::event::{LogEvent, Severity};
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Trace and span id of the operation a tracer considers active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanIds {
    pub trace_id: u64,
    pub span_id: u64,
}

/// Identifiers attached to a request-scoped [`LogContext`].
///
/// Never mutated once attached; a nested operation derives a new context
/// with its own record instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationRecord {
    pub log_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<u64>,
}

impl CorrelationRecord {
    pub fn new(log_id: impl Into<String>, span: Option<SpanIds>) -> Self {
        Self {
            log_id: log_id.into(),
            trace_id: span.map(|s| s.trace_id),
            span_id: span.map(|s| s.span_id),
        }
    }

    pub fn span(&self) -> Option<SpanIds> {
        match (self.trace_id, self.span_id) {
            (Some(trace_id), Some(span_id)) => Some(SpanIds { trace_id, span_id }),
            _ => None,
        }
    }

    /// The record as event fields (`log_id`, `trace_id`, `span_id`).
    pub fn fields(&self) -> Map<String, Json> {
        let mut fields = Map::new();
        fields.insert("log_id".to_string(), Json::from(self.log_id.clone()));
        if let Some(trace_id) = self.trace_id {
            fields.insert("trace_id".to_string(), Json::from(trace_id));
        }
        if let Some(span_id) = self.span_id {
            fields.insert("span_id".to_string(), Json::from(span_id));
        }
        fields
    }
}

/// Source of the active trace/span ids.
///
/// Any `Fn() -> Option<SpanIds>` closure is a tracer, which lets a host
/// bridge whatever tracing backend it runs.
pub trait Tracer: Send + Sync {
    fn current(&self) -> Option<SpanIds>;
}

/// Tracer that never reports an active span.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn current(&self) -> Option<SpanIds> {
        None
    }
}

impl<F> Tracer for F
where
    F: Fn() -> Option<SpanIds> + Send + Sync,
{
    fn current(&self) -> Option<SpanIds> {
        self()
    }
}

/// Produces a fresh opaque log id per logical operation.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// UUID v4 log ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        generate_log_id()
    }
}

/// Generate a new log id using UUID v4
///
/// # Examples
///
/// ```
/// use veil::logging::generate_log_id;
///
/// let log_id = generate_log_id();
/// assert!(!log_id.is_empty());
/// ```
pub fn generate_log_id() -> String {
    Uuid::new_v4().to_string()
}

/// Request-scoped logging context.
///
/// Cheap to clone. Attaching a record returns a new context and leaves the
/// original untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    record: Option<Arc<CorrelationRecord>>,
}

impl LogContext {
    /// A context with no correlation record; events carry no ids.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derive a context carrying `record`.
    pub fn with_record(&self, record: CorrelationRecord) -> Self {
        Self {
            record: Some(Arc::new(record)),
        }
    }

    /// Start a logical operation: a fresh log id plus the trace ids of the
    /// parent context when it has them, else whatever the tracer reports.
    pub fn start(parent: Option<&LogContext>, tracer: &dyn Tracer, ids: &dyn IdGenerator) -> Self {
        let span = parent
            .and_then(|p| p.record())
            .and_then(CorrelationRecord::span)
            .or_else(|| tracer.current());
        let base = parent.cloned().unwrap_or_default();
        base.with_record(CorrelationRecord::new(ids.generate(), span))
    }

    pub fn record(&self) -> Option<&CorrelationRecord> {
        self.record.as_deref()
    }

    pub fn log_id(&self) -> Option<&str> {
        self.record().map(|r| r.log_id.as_str())
    }

    /// Correlation fields for an event; empty when no record is attached.
    pub fn fields(&self) -> Map<String, Json> {
        self.record()
            .map(CorrelationRecord::fields)
            .unwrap_or_default()
    }

    /// An event at `severity` with the correlation fields attached.
    pub fn event(&self, severity: Severity, message: impl Into<String>) -> LogEvent {
        LogEvent::new(severity, message).with_fields(self.fields())
    }

    pub fn debug(&self, message: impl Into<String>) -> LogEvent {
        self.event(Severity::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> LogEvent {
        self.event(Severity::Info, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> LogEvent {
        self.event(Severity::Warn, message)
    }

    pub fn error(&self, err: &dyn fmt::Display, message: impl Into<String>) -> LogEvent {
        self.event(Severity::Error, message).with_error(err)
    }

    /// Logged at the highest severity; nothing aborts the process.
    pub fn fatal(&self, err: &dyn fmt::Display, message: impl Into<String>) -> LogEvent {
        self.event(Severity::Fatal, message).with_error(err)
    }

    pub fn panic(&self, err: &dyn fmt::Display, message: impl Into<String>) -> LogEvent {
        self.event(Severity::Panic, message).with_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedIds(&'static str);

    impl IdGenerator for FixedIds {
        fn generate(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_generate_log_id_format() {
        let id = generate_log_id();
        // UUID v4 format: xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_generate_log_id_uniqueness() {
        assert_ne!(generate_log_id(), generate_log_id());
    }

    #[test]
    fn test_generate_log_id_parseable() {
        assert!(Uuid::parse_str(&generate_log_id()).is_ok());
    }

    #[test]
    fn test_empty_context_has_no_fields() {
        let ctx = LogContext::empty();
        assert!(ctx.record().is_none());
        assert!(ctx.fields().is_empty());
        assert!(ctx.info("hello").fields.is_empty());
    }

    #[test]
    fn test_start_uses_tracer_ids() {
        let tracer = || {
            Some(SpanIds {
                trace_id: 7,
                span_id: 9,
            })
        };
        let ctx = LogContext::start(None, &tracer, &FixedIds("log-1"));

        let fields = ctx.fields();
        assert_eq!(fields["log_id"], "log-1");
        assert_eq!(fields["trace_id"], 7);
        assert_eq!(fields["span_id"], 9);
    }

    #[test]
    fn test_start_without_tracer_omits_span_fields() {
        let ctx = LogContext::start(None, &NoopTracer, &FixedIds("log-1"));
        let fields = ctx.fields();
        assert_eq!(fields.len(), 1);
        assert!(!fields.contains_key("trace_id"));
    }

    #[test]
    fn test_start_reuses_parent_trace_ids() {
        let parent = LogContext::empty().with_record(CorrelationRecord::new(
            "parent",
            Some(SpanIds {
                trace_id: 1,
                span_id: 2,
            }),
        ));
        let tracer = || {
            Some(SpanIds {
                trace_id: 99,
                span_id: 99,
            })
        };

        let child = LogContext::start(Some(&parent), &tracer, &FixedIds("child"));
        assert_eq!(child.log_id(), Some("child"));
        assert_eq!(child.record().and_then(|r| r.trace_id), Some(1));
        assert_eq!(child.record().and_then(|r| r.span_id), Some(2));
    }

    #[test]
    fn test_derived_context_leaves_parent_untouched() {
        let parent = LogContext::empty().with_record(CorrelationRecord::new("parent", None));
        let child = parent.with_record(CorrelationRecord::new("child", None));

        assert_eq!(parent.log_id(), Some("parent"));
        assert_eq!(child.log_id(), Some("child"));
    }

    #[test]
    fn test_error_helper_carries_error_and_ids() {
        let ctx = LogContext::empty().with_record(CorrelationRecord::new("abc", None));
        let err = std::io::Error::other("disk gone");
        let event = ctx.error(&err, "write failed");

        assert_eq!(event.severity, Severity::Error);
        assert_eq!(event.fields["log_id"], "abc");
        assert_eq!(event.fields["error"], "disk gone");
        assert_eq!(event.message, "write failed");
    }

    #[test]
    fn test_fatal_and_panic_keep_their_severity() {
        let ctx = LogContext::empty();
        let err = std::io::Error::other("boom");
        assert_eq!(ctx.fatal(&err, "x").severity, Severity::Fatal);
        assert_eq!(ctx.panic(&err, "x").severity, Severity::Panic);
    }
}
