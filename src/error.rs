//! Error handling for crosstalk

use std::fmt;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport-level failure (HTTP, websocket)
    Network,
    /// Credential rejected by the platform
    Authentication,
    /// Caller passed something unusable
    InvalidArgument,
    /// Operation attempted in the wrong connection state
    InvalidState,
    /// Platform sent a payload we could not make sense of
    Protocol,
    /// Configuration file missing or malformed
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network error",
            ErrorKind::Authentication => "Authentication failed",
            ErrorKind::InvalidArgument => "Invalid argument",
            ErrorKind::InvalidState => "Invalid state",
            ErrorKind::Protocol => "Protocol error",
            ErrorKind::Config => "Configuration error",
        }
    }
}

/// Crate-wide error type
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Authentication, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidArgument, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidState, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Protocol, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Config, message)
    }

    /// Whether this failure leaves the adapter permanently disconnected
    /// (bad credential) rather than eligible for a reconnect cycle.
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::Network, "Connection refused");
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.message, "Connection refused");
        assert_eq!(err.to_string(), "Network error: Connection refused");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::auth("invalid_auth").is_fatal());
        assert!(!Error::network("socket closed").is_fatal());
        assert!(!Error::protocol("bad frame").is_fatal());
    }
}
