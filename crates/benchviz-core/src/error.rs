//! Error types for benchviz.

use thiserror::Error;

/// Every failure a chart-data load can end in.
///
/// Errors are `Clone` because a single in-flight request fans its outcome out
/// to every caller waiting on the same path. The `Display` output is the
/// message consumers render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Transport errors
    #[error("{0}")]
    Transport(String),

    #[error("Response size {size} bytes exceeds maximum {max} bytes")]
    SizeLimit { size: u64, max: u64 },

    #[error("Failed to load chart data ({status}: {reason})")]
    HttpStatus { status: u16, reason: String },

    #[error("Request timed out after {millis} ms")]
    Timeout { millis: u64 },

    // Payload errors
    #[error("Invalid JSON: {0}")]
    Parse(String),

    #[error("Invalid data structure: {}", .0.join(", "))]
    Validation(Vec<String>),

    // Infrastructure errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit_message() {
        let err = Error::SizeLimit {
            size: 15_728_640,
            max: 10_485_760,
        };
        let msg = err.to_string();
        assert!(msg.contains("exceeds maximum"));
        assert!(msg.contains("15728640"));
        assert!(msg.contains("10485760"));
    }

    #[test]
    fn test_http_status_message() {
        let err = Error::HttpStatus {
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to load chart data (404: Not Found)");
    }

    #[test]
    fn test_validation_message_joins() {
        let err = Error::Validation(vec!["/nodes must be >= 1".into(), "/cluster must be string".into()]);
        assert_eq!(
            err.to_string(),
            "Invalid data structure: /nodes must be >= 1, /cluster must be string"
        );
    }

    #[test]
    fn test_transport_message_is_verbatim() {
        assert_eq!(Error::Transport("Network error".into()).to_string(), "Network error");
    }
}
