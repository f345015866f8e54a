//! axum middleware logging inbound exchanges
//!
//! Install with `axum::middleware::from_fn_with_state(Arc<HttpLogger>, ...)`.
//! Each logged request gets a fresh [`LogContext`], inserted into the request
//! extensions so handlers can log under the same ids.

use super::{HttpLogger, Phase, Side};
use crate::capture::{capture_request_body, BodyRecord, CaptureError, MirrorBody, RecordedResponse};
use crate::logging::{
    compose_request, compose_response, LogContext, Payload, RequestLine, TAG_SERVER,
    TAG_SERVER_ERROR, TAG_SERVER_PARSE_ERROR, TAG_SERVER_REQUEST, TAG_SERVER_RESPONSE,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::sync::Arc;

/// Log the request, run the handler, then log the response once its body
/// has been sent.
///
/// The handler always runs and sees the request body byte for byte, even
/// when the body is too large to log or its stream fails while being read.
pub async fn log_exchange(
    State(logger): State<Arc<HttpLogger>>,
    mut request: Request,
    next: Next,
) -> Response {
    if logger.is_ignored(request.uri().path()) {
        logger.record_ignored(request.uri().path());
        return next.run(request).await;
    }

    let ctx = attach_context(&logger, &mut request);
    let line = RequestLine::new(request.method(), request.uri());
    log_request_phase(
        &logger,
        &ctx,
        &line,
        &mut request,
        TAG_SERVER_REQUEST,
        TAG_SERVER_PARSE_ERROR,
    )
    .await;

    let response = next.run(request).await;

    let limit = logger.max_body_bytes();
    MirrorBody::wrap(response, limit, move |recorded| {
        log_response_phase(&logger, &ctx, &line, recorded);
    })
}

/// Request-only variant: logs the inbound request and passes the response
/// through untouched.
pub async fn log_request(
    State(logger): State<Arc<HttpLogger>>,
    mut request: Request,
    next: Next,
) -> Response {
    if logger.is_ignored(request.uri().path()) {
        logger.record_ignored(request.uri().path());
        return next.run(request).await;
    }

    let ctx = attach_context(&logger, &mut request);
    let line = RequestLine::new(request.method(), request.uri());
    log_request_phase(
        &logger,
        &ctx,
        &line,
        &mut request,
        TAG_SERVER,
        TAG_SERVER_ERROR,
    )
    .await;

    next.run(request).await
}

fn attach_context(logger: &HttpLogger, request: &mut Request) -> LogContext {
    let ctx = logger.start_context(request.extensions().get::<LogContext>());
    request.extensions_mut().insert(ctx.clone());
    ctx
}

/// Capture, sanitize and log the request. The request body is left
/// replayable whatever the capture outcome.
async fn log_request_phase(
    logger: &HttpLogger,
    ctx: &LogContext,
    line: &RequestLine,
    request: &mut Request,
    tag: &str,
    error_tag: &str,
) {
    let headers = logger.sanitize_headers(request.headers());
    let captured = capture_request_body(request, logger.max_body_bytes()).await;
    if let Err(err) = &captured {
        logger.record_capture_error(Side::Server, err);
    }

    let (record, error) = BodyRecord::from_capture(captured);
    let failure = error.filter(CaptureError::is_failure);
    let payload = Payload {
        headers,
        body: logger.sanitize_body(&record),
    };
    let event = compose_request(
        ctx,
        if failure.is_some() { error_tag } else { tag },
        line,
        payload,
        failure.as_ref().map(|e| e as &dyn fmt::Display),
    );
    logger.emit(Side::Server, Phase::Request, event);
}

fn log_response_phase(
    logger: &HttpLogger,
    ctx: &LogContext,
    line: &RequestLine,
    recorded: RecordedResponse,
) {
    let captured = if recorded.truncated {
        Err(CaptureError::TooLarge {
            size: recorded.bytes_written as u64,
            limit: logger.max_body_bytes(),
        })
    } else {
        Ok(recorded.body)
    };

    // Undecodable response bodies are logged as text at the normal severity
    let (record, _) = BodyRecord::from_capture(captured);
    let payload = Payload {
        headers: logger.sanitize_headers(&recorded.headers),
        body: logger.sanitize_body(&record),
    };
    let event = compose_response(
        ctx,
        TAG_SERVER_RESPONSE,
        line,
        recorded.status.as_u16(),
        payload,
        None,
    );
    logger.emit(Side::Server, Phase::Response, event);
}
