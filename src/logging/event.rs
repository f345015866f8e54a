//! Log events and the per-phase composer for HTTP exchanges

use super::correlation::LogContext;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value as Json};
use std::fmt;

pub const TAG_SERVER: &str = "HTTP Server";
pub const TAG_SERVER_REQUEST: &str = "HTTP Server - Request |";
pub const TAG_SERVER_RESPONSE: &str = "HTTP Server - Response |";
pub const TAG_SERVER_PARSE_ERROR: &str = "HTTP Server - Request | Error when parse body";
pub const TAG_SERVER_ERROR: &str = "HTTP Server | Error when parse body";
pub const TAG_CLIENT: &str = "HTTP Client";

/// Event severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured log entry handed to a [`LogSink`](super::LogSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub fields: Map<String, Json>,
    pub message: String,
}

impl LogEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            timestamp: Utc::now(),
            fields: Map::new(),
            message: message.into(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Map<String, Json>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_error(self, err: &dyn fmt::Display) -> Self {
        self.with_field("error", err.to_string())
    }

    pub fn field(&self, key: &str) -> Option<&Json> {
        self.fields.get(key)
    }
}

/// Method and URL of the request an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub url: String,
}

impl RequestLine {
    pub fn new(method: impl fmt::Display, url: impl fmt::Display) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
        }
    }
}

/// Sanitized parts of one phase of an exchange.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    pub headers: Json,
    pub body: Json,
}

/// Build the request-phase event: `"<tag> <METHOD> <URL>"`.
///
/// An error raises the severity to [`Severity::Error`] and is recorded under
/// `extra.error`.
pub fn compose_request(
    ctx: &LogContext,
    tag: &str,
    line: &RequestLine,
    payload: Payload,
    error: Option<&dyn fmt::Display>,
) -> LogEvent {
    let mut extra = Map::new();
    if let Some(err) = error {
        extra.insert("error".to_string(), Json::from(err.to_string()));
    }
    extra.insert("url".to_string(), Json::from(line.url.clone()));
    extra.insert("method".to_string(), Json::from(line.method.clone()));

    let message = format!("{} {} {}", tag, line.method, line.url);
    finish(ctx, message, payload, extra, error.is_some())
}

/// Build the response-phase event: `"<tag> <METHOD> <STATUS> <URL>"`.
pub fn compose_response(
    ctx: &LogContext,
    tag: &str,
    line: &RequestLine,
    status: u16,
    payload: Payload,
    error: Option<&dyn fmt::Display>,
) -> LogEvent {
    let mut extra = Map::new();
    if let Some(err) = error {
        extra.insert("error".to_string(), Json::from(err.to_string()));
    }
    extra.insert("status".to_string(), Json::from(status));
    extra.insert(
        "request".to_string(),
        json!({"url": line.url, "method": line.method}),
    );

    let message = format!("{} {} {} {}", tag, line.method, status, line.url);
    finish(ctx, message, payload, extra, error.is_some())
}

fn finish(
    ctx: &LogContext,
    message: String,
    payload: Payload,
    extra: Map<String, Json>,
    failed: bool,
) -> LogEvent {
    let severity = if failed {
        Severity::Error
    } else {
        Severity::Info
    };
    ctx.event(severity, message)
        .with_field("headers", payload.headers)
        .with_field("body", payload.body)
        .with_field("extra", Json::Object(extra))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::correlation::CorrelationRecord;

    fn line() -> RequestLine {
        RequestLine::new("POST", "/accounts?x=1")
    }

    fn payload() -> Payload {
        Payload {
            headers: json!({"content-type": "application/json"}),
            body: json!({"password": "REDACTED"}),
        }
    }

    #[test]
    fn test_request_event_message_and_extra() {
        let ctx = LogContext::empty().with_record(CorrelationRecord::new("id-1", None));
        let event = compose_request(&ctx, TAG_SERVER, &line(), payload(), None);

        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.message, "HTTP Server POST /accounts?x=1");
        assert_eq!(event.fields["log_id"], "id-1");
        assert_eq!(
            event.fields["extra"],
            json!({"url": "/accounts?x=1", "method": "POST"})
        );
        assert_eq!(event.fields["body"], json!({"password": "REDACTED"}));
    }

    #[test]
    fn test_response_event_carries_status_and_request() {
        let event = compose_response(
            &LogContext::empty(),
            TAG_SERVER_RESPONSE,
            &line(),
            201,
            payload(),
            None,
        );

        assert_eq!(
            event.message,
            "HTTP Server - Response | POST 201 /accounts?x=1"
        );
        assert_eq!(event.fields["extra"]["status"], 201);
        assert_eq!(
            event.fields["extra"]["request"],
            json!({"url": "/accounts?x=1", "method": "POST"})
        );
        assert!(event.field("log_id").is_none());
    }

    #[test]
    fn test_error_raises_severity() {
        let err = std::io::Error::other("unexpected end of input");
        let event = compose_request(
            &LogContext::empty(),
            TAG_SERVER_PARSE_ERROR,
            &line(),
            payload(),
            Some(&err as &dyn fmt::Display),
        );

        assert_eq!(event.severity, Severity::Error);
        assert_eq!(event.fields["extra"]["error"], "unexpected end of input");
        assert!(event
            .message
            .starts_with("HTTP Server - Request | Error when parse body POST"));
    }

    #[test]
    fn test_severity_ordering_and_display() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Error < Severity::Fatal);
        assert_eq!(Severity::Warn.to_string(), "warn");
        assert_eq!(serde_json::to_string(&Severity::Panic).unwrap(), "\"panic\"");
    }
}
