//! Error types for body capture.

use thiserror::Error;

/// Errors that can occur while capturing a body for logging.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The body stream failed mid-read
    #[error("failed to read body: {0}")]
    Read(String),

    /// Body exceeds the capture limit; `size` is the declared size, or the
    /// bytes produced when it was cut short
    #[error("body of at least {size} bytes exceeds capture limit of {limit} bytes")]
    TooLarge { size: u64, limit: usize },

    /// The limit was crossed while reading; the body is still forwarded
    #[error("body exceeded capture limit of {limit} bytes while reading")]
    LimitExceeded { limit: usize },

    /// Content-Encoding: deflate could not be inflated
    #[error("failed to decompress deflate body: {0}")]
    Decompress(#[source] std::io::Error),

    /// Body is not valid JSON
    #[error("body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl CaptureError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::Read(_) => "read",
            CaptureError::TooLarge { .. } => "too_large",
            CaptureError::LimitExceeded { .. } => "limit_exceeded",
            CaptureError::Decompress(_) => "decompress",
            CaptureError::Decode(_) => "decode",
        }
    }

    /// False when the body was merely too large to log.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            CaptureError::TooLarge { .. } | CaptureError::LimitExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unreadable_bodies_are_failures() {
        assert!(CaptureError::Read("reset".into()).is_failure());
        assert!(!CaptureError::LimitExceeded { limit: 1 }.is_failure());
        assert!(!CaptureError::TooLarge { size: 2, limit: 1 }.is_failure());

        let decode = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        assert!(CaptureError::Decode(decode).is_failure());
    }

    #[test]
    fn test_display_mentions_limit() {
        let err = CaptureError::TooLarge {
            size: 2048,
            limit: 1024,
        };
        assert!(err.to_string().contains("1024"));
        assert_eq!(err.kind(), "too_large");
        assert!(!err.is_failure());
    }
}
