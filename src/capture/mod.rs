//! # Body Capture
//!
//! Reads HTTP bodies for logging without changing what the downstream
//! consumer sees.
//!
//! - inbound server requests are buffered and re-installed as an in-memory
//!   body ([`capture_request_body`])
//! - server responses are wrapped in [`MirrorBody`], which copies every frame
//!   while forwarding it
//! - client responses are buffered, inflated when `Content-Encoding: deflate`,
//!   and rebuilt ([`capture_client_response`])
//!
//! Every path buffers a full in-memory copy, bounded by the configured limit.

pub mod body;
pub mod error;
pub mod mirror;

pub use body::{
    capture_client_request, capture_client_response, capture_request_body, inflate,
    read_bounded, BodyRecord, BoundedRead, CapturedBody, OriginalUrl,
};
pub use error::CaptureError;
pub use mirror::{MirrorBody, RecordedResponse};
