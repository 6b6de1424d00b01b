//! Error types for DataQuest.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for DataQuest operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataQuestError {
    /// The backend answered with a non-2xx status.
    #[error("Backend rejected the request ({status}){}", fmt_detail(.detail))]
    Rejected {
        /// HTTP status code returned by the backend.
        status: u16,
        /// The `detail` field of the error body, if there was one.
        detail: Option<String>,
    },

    /// Transport failures (connection refused, timeouts, broken bodies).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A 2xx response whose body does not match the backend contract.
    #[error("Response error: {0}")]
    Response(String),

    /// Configuration errors (invalid config file, bad backend URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal setup, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

impl DataQuestError {
    /// Creates a rejection error for the given status and optional detail.
    pub fn rejected(status: u16, detail: Option<String>) -> Self {
        Self::Rejected { status, detail }
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a response error with the given message.
    pub fn response(msg: impl Into<String>) -> Self {
        Self::Response(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the backend-provided detail, if the backend sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "Backend Error",
            Self::Transport(_) => "Transport Error",
            Self::Response(_) => "Response Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using DataQuestError.
pub type Result<T> = std::result::Result<T, DataQuestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_rejected_with_detail() {
        let err = DataQuestError::rejected(400, Some("SQLite error: no such table: users".into()));
        assert_eq!(
            err.to_string(),
            "Backend rejected the request (400): SQLite error: no such table: users"
        );
        assert_eq!(err.category(), "Backend Error");
        assert_eq!(err.detail(), Some("SQLite error: no such table: users"));
    }

    #[test]
    fn test_error_display_rejected_without_detail() {
        let err = DataQuestError::rejected(502, None);
        assert_eq!(err.to_string(), "Backend rejected the request (502)");
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn test_error_display_transport() {
        let err = DataQuestError::transport("connection refused");
        assert_eq!(err.to_string(), "Transport error: connection refused");
        assert_eq!(err.category(), "Transport Error");
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn test_error_display_response() {
        let err = DataQuestError::response("missing field `sql_query`");
        assert_eq!(err.to_string(), "Response error: missing field `sql_query`");
        assert_eq!(err.category(), "Response Error");
    }

    #[test]
    fn test_error_display_config() {
        let err = DataQuestError::config("invalid backend URL");
        assert_eq!(err.to_string(), "Configuration error: invalid backend URL");
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_display_internal() {
        let err = DataQuestError::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
        assert_eq!(err.category(), "Internal Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DataQuestError>();
    }
}
