//! Response body decorator that copies what the handler writes.

use super::body::CapturedBody;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};

/// What the handler wrote, handed to the completion callback.
#[derive(Debug, Clone)]
pub struct RecordedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: CapturedBody,
    /// Bytes written in total, including any past the mirror limit
    pub bytes_written: usize,
    /// True when the mirror stopped copying at the limit
    pub truncated: bool,
}

type OnComplete = Box<dyn FnOnce(RecordedResponse) + Send + 'static>;

/// Forwards every frame of the inner body unchanged while keeping a copy of
/// the data (up to `limit` bytes).
///
/// The callback runs once: at end of stream, on a stream error, or when the
/// body is dropped early (client went away).
pub struct MirrorBody {
    inner: Body,
    status: StatusCode,
    headers: HeaderMap,
    buffer: Vec<u8>,
    limit: usize,
    bytes_written: usize,
    truncated: bool,
    on_complete: Option<OnComplete>,
}

impl MirrorBody {
    /// Replace the body of `response` with a mirroring decorator.
    pub fn wrap<F>(response: Response, limit: usize, on_complete: F) -> Response
    where
        F: FnOnce(RecordedResponse) + Send + 'static,
    {
        let (parts, body) = response.into_parts();
        let mirror = MirrorBody {
            inner: body,
            status: parts.status,
            headers: parts.headers.clone(),
            buffer: Vec::new(),
            limit,
            bytes_written: 0,
            truncated: false,
            on_complete: Some(Box::new(on_complete)),
        };
        Response::from_parts(parts, Body::new(mirror))
    }

    fn record(&mut self, data: &[u8]) {
        self.bytes_written += data.len();
        let room = self.limit.saturating_sub(self.buffer.len());
        if data.len() > room {
            self.truncated = true;
        }
        self.buffer.extend_from_slice(&data[..data.len().min(room)]);
    }

    fn finish(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(RecordedResponse {
                status: self.status,
                headers: std::mem::take(&mut self.headers),
                body: CapturedBody::new(std::mem::take(&mut self.buffer)),
                bytes_written: self.bytes_written,
                truncated: self.truncated,
            });
        }
    }
}

impl HttpBody for MirrorBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    self.record(data);
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => self.finish(),
            Poll::Pending => {}
        }
        polled
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }
}

impl Drop for MirrorBody {
    fn drop(&mut self) {
        self.finish();
    }
}
