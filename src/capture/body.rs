//! Body extraction that leaves the exchange readable downstream.

use super::error::CaptureError;
use crate::redact::{sanitize, Policy, Value};
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode, Version};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use futures::{future, stream, StreamExt};
use http_body::Body as HttpBody;
use std::io::Read;

/// Response extension carrying the URL of a rebuilt client response.
///
/// `reqwest` cannot carry the original URL over when a response is rebuilt
/// from buffered bytes, so it is kept here instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalUrl(pub reqwest::Url);

/// Bytes of an intercepted body, as seen by the downstream reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedBody {
    bytes: Bytes,
}

impl CapturedBody {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the body as JSON. An empty body decodes to [`Value::Null`].
    pub fn decode(&self) -> Result<Value, CaptureError> {
        if self.bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice::<serde_json::Value>(&self.bytes)
            .map(Value::from)
            .map_err(CaptureError::Decode)
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// What ends up in the `body` field of a log event.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyRecord {
    /// Decoded JSON document
    Structured(Value),
    /// Raw payload that did not decode as JSON
    Text(String),
    /// Nothing was captured; the reason is logged instead
    Omitted(String),
}

impl BodyRecord {
    /// Turn a capture outcome into a loggable record.
    ///
    /// Decode failures fall back to the raw text; the error is handed back so
    /// the caller can decide on the event severity.
    pub fn from_capture(
        captured: Result<CapturedBody, CaptureError>,
    ) -> (BodyRecord, Option<CaptureError>) {
        match captured {
            Ok(body) => match body.decode() {
                Ok(value) => (BodyRecord::Structured(value), None),
                Err(e) => (BodyRecord::Text(body.text()), Some(e)),
            },
            Err(e) => (BodyRecord::Omitted(e.to_string()), Some(e)),
        }
    }

    /// Sanitized JSON for the log event.
    pub fn sanitize(&self, policy: &Policy) -> serde_json::Value {
        match self {
            BodyRecord::Structured(value) => sanitize(policy, value),
            BodyRecord::Text(text) => sanitize(policy, &Value::String(text.clone())),
            BodyRecord::Omitted(reason) => {
                serde_json::Value::String(format!("<body not captured: {}>", reason))
            }
        }
    }
}

/// Buffer a server-side request body for logging.
///
/// On return the request always carries a body that replays exactly what
/// the client sent, whatever the capture outcome. When the declared size
/// exceeds `limit` nothing is read and the body is left untouched. When the
/// limit is crossed while reading, the bytes read so far are replayed ahead
/// of the unread rest of the stream. A stream failure is replayed after the
/// bytes that preceded it, so the handler sees the same error.
pub async fn capture_request_body(
    request: &mut Request<Body>,
    limit: usize,
) -> Result<CapturedBody, CaptureError> {
    let declared = declared_length(request.headers(), request.body());
    if declared > limit as u64 {
        return Err(CaptureError::TooLarge {
            size: declared,
            limit,
        });
    }

    let body = std::mem::take(request.body_mut());
    match read_bounded(body, limit).await {
        BoundedRead::Complete(bytes) => {
            *request.body_mut() = Body::from(bytes.clone());
            Ok(CapturedBody::new(bytes))
        }
        BoundedRead::Overflow { replay } => {
            *request.body_mut() = replay;
            Err(CaptureError::LimitExceeded { limit })
        }
        BoundedRead::Failed { replay, error } => {
            *request.body_mut() = replay;
            Err(CaptureError::Read(error))
        }
    }
}

/// Outcome of [`read_bounded`].
pub enum BoundedRead {
    /// The whole body fit within the limit
    Complete(Bytes),
    /// The limit was crossed; `replay` yields every byte, read or not
    Overflow { replay: Body },
    /// The stream failed; `replay` yields the bytes read, then the failure
    Failed { replay: Body, error: String },
}

/// Read a body into memory, stopping once more than `limit` bytes arrive.
///
/// Nothing is lost when the read stops early: the returned replay body
/// carries the consumed prefix followed by the rest of the stream.
pub async fn read_bounded(body: Body, limit: usize) -> BoundedRead {
    let mut stream = body.into_data_stream();
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                let overflow = buffer.len() + chunk.len() > limit;
                buffer.extend_from_slice(&chunk);
                if overflow {
                    let prefix = stream::once(future::ready(Ok::<_, axum::Error>(Bytes::from(buffer))));
                    return BoundedRead::Overflow {
                        replay: Body::from_stream(prefix.chain(stream)),
                    };
                }
            }
            Err(e) => {
                let error = e.to_string();
                let replay = stream::iter(vec![Ok(Bytes::from(buffer)), Err(e)]);
                return BoundedRead::Failed {
                    replay: Body::from_stream(replay),
                    error,
                };
            }
        }
    }

    BoundedRead::Complete(Bytes::from(buffer))
}

fn declared_length(headers: &HeaderMap, body: &Body) -> u64 {
    let from_header = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);
    from_header.max(HttpBody::size_hint(body).lower())
}

/// Capture a client request body without consuming it.
///
/// Buffered bodies are returned as-is (absent bodies as empty). Streaming
/// bodies cannot be read without consuming them and yield `None`.
pub fn capture_client_request(request: &reqwest::Request) -> Option<CapturedBody> {
    match request.body() {
        None => Some(CapturedBody::default()),
        Some(body) => body
            .as_bytes()
            .map(|bytes| CapturedBody::new(Bytes::copy_from_slice(bytes))),
    }
}

/// Buffer a client response body for logging and hand back an equivalent
/// response.
///
/// `Content-Encoding: deflate` bodies are inflated (zlib-wrapped or raw);
/// the returned response then carries the inflated bytes without the
/// `Content-Encoding` and `Content-Length` headers. When inflating fails, or
/// would produce more than `limit` bytes, the returned response carries the
/// bytes exactly as received. Bodies over `limit` are handed back intact and
/// reported as [`CaptureError::TooLarge`].
///
/// A transport failure while reading the body is reported as
/// [`CaptureError::Read`]; the returned response replays the bytes that did
/// arrive and then fails the same way, so a caller that never reads the body
/// is unaffected.
pub async fn capture_client_response(
    mut response: reqwest::Response,
    limit: usize,
) -> (reqwest::Response, Result<CapturedBody, CaptureError>) {
    let status = response.status();
    let version = response.version();
    let url = response.url().clone();
    let mut headers = response.headers().clone();

    let mut received = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => received.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                let error = CaptureError::Read(e.to_string());
                let replay = stream::iter(vec![Ok(Bytes::from(received)), Err(e)]);
                let rebuilt = rebuild_response(
                    status,
                    version,
                    headers,
                    url,
                    reqwest::Body::wrap_stream(replay),
                );
                return (rebuilt, Err(error));
            }
        }
    }
    let raw = Bytes::from(received);

    let (bytes, captured) = if is_deflate(&headers) && !raw.is_empty() {
        match inflate(&raw, limit) {
            Ok(inflated) => {
                headers.remove(header::CONTENT_ENCODING);
                headers.remove(header::CONTENT_LENGTH);
                let inflated = Bytes::from(inflated);
                (inflated.clone(), Ok(CapturedBody::new(inflated)))
            }
            Err(e) => (raw, Err(e)),
        }
    } else if raw.len() > limit {
        let size = raw.len() as u64;
        (raw, Err(CaptureError::TooLarge { size, limit }))
    } else {
        (raw.clone(), Ok(CapturedBody::new(raw)))
    };

    (
        rebuild_response(status, version, headers, url, bytes),
        captured,
    )
}

fn rebuild_response(
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: reqwest::Url,
    body: impl Into<reqwest::Body>,
) -> reqwest::Response {
    let mut rebuilt = axum::http::Response::new(body.into());
    *rebuilt.status_mut() = status;
    *rebuilt.version_mut() = version;
    *rebuilt.headers_mut() = headers;
    rebuilt.extensions_mut().insert(OriginalUrl(url));
    reqwest::Response::from(rebuilt)
}

fn is_deflate(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("deflate"))
}

/// Inflate a deflate body, accepting both the zlib-wrapped form (RFC 1950)
/// and raw deflate (RFC 1951) sent by some servers.
///
/// Stops after `limit + 1` inflated bytes and reports
/// [`CaptureError::TooLarge`], so a small compressed body cannot expand
/// without bound.
pub fn inflate(bytes: &[u8], limit: usize) -> Result<Vec<u8>, CaptureError> {
    let cap = (limit as u64).saturating_add(1);
    let mut out = Vec::new();
    let read = if has_zlib_header(bytes) {
        ZlibDecoder::new(bytes).take(cap).read_to_end(&mut out)
    } else {
        DeflateDecoder::new(bytes).take(cap).read_to_end(&mut out)
    };
    read.map_err(CaptureError::Decompress)?;

    if out.len() > limit {
        return Err(CaptureError::TooLarge {
            size: out.len() as u64,
            limit,
        });
    }
    Ok(out)
}

fn has_zlib_header(bytes: &[u8]) -> bool {
    match bytes {
        [cmf, flg, ..] => cmf & 0x0f == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}
