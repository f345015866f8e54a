//! # Exchange Logging
//!
//! Adapters that run the capture, redaction and event pipeline around real
//! HTTP traffic:
//!
//! - [`server::log_exchange`] / [`server::log_request`]: axum middleware
//! - [`client::LoggingClient`]: a `reqwest::Client` wrapper
//!
//! Both share one [`HttpLogger`], which owns the policy and the collaborators
//! (sink, tracer, id generator). It is read-only once built and safe to share
//! across any number of concurrent exchanges.

pub mod client;
pub mod server;

pub use client::{ClientError, LoggingClient};
pub use server::{log_exchange, log_request};

use crate::capture::{BodyRecord, CaptureError};
use crate::config::{VeilConfig, DEFAULT_MAX_BODY_BYTES};
use crate::logging::{
    sanitize_headers, IdGenerator, LogContext, LogEvent, LogSink, NoopTracer, Tracer,
    TracingSink, UuidGenerator,
};
use crate::redact::Policy;
use axum::http::HeaderMap;
use serde_json::Value as Json;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Which adapter produced an event (metrics label).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Server,
    Client,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Server => "server",
            Side::Client => "client",
        }
    }
}

/// Which half of the exchange an event describes (metrics label).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Request,
    Response,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Request => "request",
            Phase::Response => "response",
        }
    }
}

/// Shared state of the exchange adapters.
#[derive(Clone)]
pub struct HttpLogger {
    policy: Arc<Policy>,
    ignored_paths: Arc<HashSet<String>>,
    max_body_bytes: usize,
    sink: Arc<dyn LogSink>,
    tracer: Arc<dyn Tracer>,
    ids: Arc<dyn IdGenerator>,
}

impl fmt::Debug for HttpLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLogger")
            .field("policy", &self.policy)
            .field("ignored_paths", &self.ignored_paths)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl HttpLogger {
    /// Logger writing to `tracing`, without a tracer, using UUID log ids.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: Arc::new(policy),
            ignored_paths: Arc::new(HashSet::new()),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            sink: Arc::new(TracingSink),
            tracer: Arc::new(NoopTracer),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Logger that records bodies and headers without rewriting them.
    pub fn plain() -> Self {
        Self::new(Policy::empty())
    }

    pub fn from_config(config: &VeilConfig) -> Self {
        Self::new(config.policy())
            .with_ignored_paths(&config.redaction.ignored_paths)
            .with_max_body_bytes(config.redaction.max_body_bytes)
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_tracer(mut self, tracer: impl Tracer + 'static) -> Self {
        self.tracer = Arc::new(tracer);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Exact request paths (query excluded) that skip logging entirely.
    pub fn with_ignored_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_paths = Arc::new(paths.into_iter().map(|p| p.as_ref().to_string()).collect());
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Mutable access for adding keys; clones the policy if it is shared.
    pub fn policy_mut(&mut self) -> &mut Policy {
        Arc::make_mut(&mut self.policy)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_paths.contains(path)
    }

    pub fn sanitize_headers(&self, headers: &HeaderMap) -> Json {
        sanitize_headers(&self.policy, headers)
    }

    pub fn sanitize_body(&self, record: &BodyRecord) -> Json {
        record.sanitize(&self.policy)
    }

    /// Context for a new exchange, nested under `parent` when given.
    pub fn start_context(&self, parent: Option<&LogContext>) -> LogContext {
        LogContext::start(parent, self.tracer.as_ref(), self.ids.as_ref())
    }

    pub(crate) fn emit(&self, side: Side, phase: Phase, event: LogEvent) {
        metrics::counter!("veil_exchanges_logged_total",
            "side" => side.as_str(),
            "phase" => phase.as_str()
        )
        .increment(1);
        self.sink.emit(&event);
    }

    pub(crate) fn record_capture_error(&self, side: Side, err: &CaptureError) {
        metrics::counter!("veil_capture_errors_total", "kind" => err.kind()).increment(1);
        tracing::debug!(side = side.as_str(), kind = err.kind(), error = %err, "Body capture failed");
    }

    pub(crate) fn record_ignored(&self, path: &str) {
        metrics::counter!("veil_exchanges_ignored_total").increment(1);
        tracing::trace!(path, "Skipping ignored path");
    }
}

impl Default for HttpLogger {
    fn default() -> Self {
        Self::new(Policy::default_keys())
    }
}
