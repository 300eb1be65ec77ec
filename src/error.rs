//! Error types for the dashboard
//!
//! Uses thiserror for ergonomic error definitions.
//! Fetch errors are non-fatal: the poll loop logs them and retries on the next tick.

use thiserror::Error;

/// Custom Result type using our Error
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Dashboard errors
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request never produced a response (connect failure, reset, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the backend
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Malformed JSON or missing fields
    #[error("Decode error: {0}")]
    Decode(String),

    /// Backend answered `{"status": "error", "message": ...}`
    #[error("Backend error: {0}")]
    Backend(String),

    /// Renderer targeted a mount point the page does not have
    #[error("Missing mount point: {0}")]
    MissingMount(String),

    /// Unknown command typed on the console
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File output errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    HttpStatus,
    Decode,
    Backend,
    Other,
}

impl DashboardError {
    /// Classify the error for the poll loop and the logs
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::Network(_) => ErrorKind::Network,
            DashboardError::HttpStatus { .. } => ErrorKind::HttpStatus,
            DashboardError::Decode(_) => ErrorKind::Decode,
            DashboardError::Backend(_) => ErrorKind::Backend,
            _ => ErrorKind::Other,
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Decode(err.to_string())
        } else if err.is_timeout() {
            DashboardError::Network(format!("request timed out: {err}"))
        } else {
            DashboardError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashboardError::HttpStatus { status: 502, body: "Bad Gateway".to_string() };
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: DashboardError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(DashboardError::Network("refused".into()).kind(), ErrorKind::Network);
        assert_eq!(DashboardError::Backend("no data".into()).kind(), ErrorKind::Backend);
        assert_eq!(DashboardError::MissingMount("x".into()).kind(), ErrorKind::Other);
    }
}
