//! reqwest wrapper logging outbound exchanges

use super::{HttpLogger, Phase, Side};
use crate::capture::{capture_client_request, capture_client_response, BodyRecord, CaptureError};
use crate::logging::{
    compose_request, compose_response, LogContext, Payload, RequestLine, TAG_CLIENT,
};
use reqwest::{IntoUrl, Method, Request, RequestBuilder, Response};
use serde_json::Value as Json;
use std::fmt;
use thiserror::Error;

/// Errors returned by [`LoggingClient`]. All of them are logged before being
/// handed back.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request builder could not produce a request
    #[error("invalid request: {0}")]
    Build(#[source] reqwest::Error),

    /// Sending the request failed
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// `reqwest::Client` that logs every request and response it carries.
///
/// Response bodies are buffered for logging and handed back as an
/// equivalent response; `Content-Encoding: deflate` bodies come back
/// inflated. Use [`OriginalUrl`](crate::capture::OriginalUrl) from the
/// response extensions to recover the URL.
///
/// Failures while reading the response body are logged and then left in
/// the returned body, surfacing when the caller reads it, as with a plain
/// `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct LoggingClient {
    inner: reqwest::Client,
    logger: HttpLogger,
}

impl LoggingClient {
    pub fn new(logger: HttpLogger) -> Self {
        Self::with_client(reqwest::Client::new(), logger)
    }

    pub fn with_client(inner: reqwest::Client, logger: HttpLogger) -> Self {
        Self { inner, logger }
    }

    pub fn logger(&self) -> &HttpLogger {
        &self.logger
    }

    pub fn add_keys_to_redact<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.logger.policy_mut().add_redact_keys(keys);
    }

    pub fn add_keys_to_mask<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.logger.policy_mut().add_mask_keys(keys);
    }

    /// Start building a request; send it with [`LoggingClient::send`].
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.inner.request(method, url)
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let request = builder.build().map_err(ClientError::Build)?;
        self.execute(request).await
    }

    /// Execute under a fresh log context.
    pub async fn execute(&self, request: Request) -> Result<Response, ClientError> {
        let ctx = self.logger.start_context(None);
        self.execute_in(&ctx, request).await
    }

    /// Execute as part of an existing operation; events carry `ctx`'s ids.
    pub async fn execute_in(
        &self,
        ctx: &LogContext,
        request: Request,
    ) -> Result<Response, ClientError> {
        let logger = &self.logger;
        let line = RequestLine::new(request.method(), request.url());
        let request_headers = logger.sanitize_headers(request.headers());

        // Client request bodies that fail to decode are logged as text
        let request_body = match capture_client_request(&request) {
            Some(captured) => logger.sanitize_body(&BodyRecord::from_capture(Ok(captured)).0),
            None => Json::from("<streaming body not captured>"),
        };
        let event = compose_request(
            ctx,
            TAG_CLIENT,
            &line,
            Payload {
                headers: request_headers.clone(),
                body: request_body,
            },
            None,
        );
        logger.emit(Side::Client, Phase::Request, event);

        let response = match self.inner.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                let payload = Payload {
                    headers: request_headers,
                    body: Json::Null,
                };
                let error = Some(&err as &dyn fmt::Display);
                let event = compose_request(ctx, TAG_CLIENT, &line, payload, error);
                logger.emit(Side::Client, Phase::Response, event);
                return Err(ClientError::Transport(err));
            }
        };

        let status = response.status().as_u16();
        let response_headers = logger.sanitize_headers(response.headers());

        let (response, captured) =
            capture_client_response(response, logger.max_body_bytes()).await;
        if let Err(err) = &captured {
            logger.record_capture_error(Side::Client, err);
        }
        let (record, error) = BodyRecord::from_capture(captured);
        // Undecodable response bodies are logged as text at the normal severity
        let failure =
            error.filter(|e| matches!(e, CaptureError::Decompress(_) | CaptureError::Read(_)));
        let event = compose_response(
            ctx,
            TAG_CLIENT,
            &line,
            status,
            Payload {
                headers: response_headers,
                body: logger.sanitize_body(&record),
            },
            failure.as_ref().map(|e| e as &dyn fmt::Display),
        );
        logger.emit(Side::Client, Phase::Response, event);

        Ok(response)
    }
}
