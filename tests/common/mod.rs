//! Shared test utilities for veil integration tests.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::Value as Json;
use std::sync::Arc;
use veil::exchange::{log_exchange, log_request, HttpLogger};
use veil::logging::{IdGenerator, LogEvent, MemorySink};
use veil::redact::Policy;

/// UUID v4 string length: "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
pub const UUID_V4_STRING_LEN: usize = 36;

/// Payload used throughout the redaction scenarios.
pub const ACCOUNT_BODY: &str =
    r#"{"name":"Joao Silva","document":"58707647000","password":"hunter2","card":{"number":"5111786674841746","code":"123"}}"#;

/// Log ids "log-1", "log-2", ... in call order.
#[derive(Default)]
pub struct SequentialIds(std::sync::atomic::AtomicU64);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        format!("log-{}", n)
    }
}

/// Logger with `policy` writing into a fresh memory sink.
pub fn memory_logger(policy: Policy) -> (HttpLogger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = HttpLogger::new(policy)
        .with_sink(sink.clone())
        .with_id_generator(SequentialIds::default());
    (logger, sink)
}

/// Routes used by the server tests, wrapped with [`log_exchange`].
pub fn exchange_app(logger: HttpLogger) -> Router {
    routes().layer(middleware::from_fn_with_state(Arc::new(logger), log_exchange))
}

/// Same routes wrapped with the request-only [`log_request`].
pub fn request_only_app(logger: HttpLogger) -> Router {
    routes().layer(middleware::from_fn_with_state(Arc::new(logger), log_request))
}

fn routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/echo", post(|body: Bytes| async move { body }))
        .route(
            "/accounts",
            post(|| async {
                axum::Json(serde_json::json!({
                    "id": 7,
                    "access_token": "tok-123",
                    "document": "0192309128390128"
                }))
            }),
        )
        .route(
            "/stream",
            get(|| async {
                let chunks = futures::stream::iter(vec![
                    Ok::<_, std::io::Error>(Bytes::from_static(b"{\"password\":")),
                    Ok(Bytes::from_static(b"\"p\"}")),
                ]);
                Body::from_stream(chunks)
            }),
        )
}

pub fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", "Bearer secret-token")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub fn field<'a>(event: &'a LogEvent, key: &str) -> &'a Json {
    event
        .field(key)
        .unwrap_or_else(|| panic!("event '{}' has no field '{}'", event.message, key))
}
