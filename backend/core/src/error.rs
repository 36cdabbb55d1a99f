use std::time::Duration;

use thiserror::Error;

use crate::types::{MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Top-level error type for a recognition request.
///
/// Every variant maps to a stable wire code via [`ScanError::code`]. Upstream
/// failures have no code of their own and surface as `INTERNAL_ERROR`.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no image data was provided")]
    NoImage,

    #[error(
        "concurrency must be between {min} and {max}, got {0}",
        min = MIN_CONCURRENCY,
        max = MAX_CONCURRENCY
    )]
    InvalidConcurrency(i64),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("image is {size_bytes} bytes, the limit is {limit_mb} MB")]
    ImageTooLarge { size_bytes: usize, limit_mb: u64 },

    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    #[error("model API key is not configured")]
    NoApiKey,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("model call to {model} failed: {message}")]
    Upstream { model: String, message: String },

    #[error("model call to {model} timed out after {after:?}")]
    Timeout { model: String, after: Duration },

    #[error("no valid content was recognized, check that the image is legible and retry")]
    NoValidResults,

    #[error("the recognition results could not be consolidated")]
    ConsolidationFailed,

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    /// Wire code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::NoImage => "NO_IMAGE",
            ScanError::InvalidConcurrency(_) => "INVALID_CONCURRENCY",
            ScanError::InvalidImage(_) => "INVALID_IMAGE",
            ScanError::ImageTooLarge { .. } => "IMAGE_TOO_LARGE",
            ScanError::InvalidRequest(_) => "INVALID_REQUEST",
            ScanError::NoApiKey => "NO_API_KEY",
            ScanError::NoValidResults => "NO_VALID_RESULTS",
            ScanError::ConsolidationFailed => "CONSOLIDATION_FAILED",
            ScanError::Config(_)
            | ScanError::Upstream { .. }
            | ScanError::Timeout { .. }
            | ScanError::Internal(_)
            | ScanError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScanError::NoImage
                | ScanError::InvalidConcurrency(_)
                | ScanError::InvalidImage(_)
                | ScanError::ImageTooLarge { .. }
                | ScanError::InvalidRequest(_)
        )
    }

    /// Whether the error came from the remote model API.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ScanError::Upstream { .. } | ScanError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_failures_surface_as_internal_error() {
        let err = ScanError::Upstream {
            model: "qwen-vl-max-latest".into(),
            message: "502 Bad Gateway".into(),
        };
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.is_upstream());
        assert!(!err.is_client_error());

        let err = ScanError::Timeout {
            model: "qwen-vl-max-latest".into(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.is_upstream());
    }

    #[test]
    fn validation_failures_are_client_errors() {
        assert_eq!(ScanError::NoImage.code(), "NO_IMAGE");
        assert!(ScanError::NoImage.is_client_error());
        assert_eq!(ScanError::InvalidConcurrency(11).code(), "INVALID_CONCURRENCY");
        assert!(ScanError::InvalidConcurrency(0).is_client_error());
        assert!(!ScanError::NoApiKey.is_client_error());
        assert_eq!(ScanError::NoApiKey.code(), "NO_API_KEY");
    }

    #[test]
    fn concurrency_message_names_the_range() {
        let msg = ScanError::InvalidConcurrency(42).to_string();
        assert!(msg.contains("between 1 and 10"));
        assert!(msg.contains("42"));
    }
}
