//! Error types for configuration and the streaming connection

use reqwest::StatusCode;
use thiserror::Error;

/// Failure reported by the streaming connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The stream endpoint answered with a non-success HTTP status
    #[error("stream endpoint returned HTTP {status}")]
    Http { status: StatusCode },

    /// Connection or read failure with no HTTP status attached
    #[error("stream transport failure: {message}")]
    Transport { message: String },
}

/// Whether the transport can keep retrying or the client must give up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transport retries on its own; nothing to surface
    Recoverable,
    /// Retrying cannot help (bad credentials); the connection is dead
    Unrecoverable,
}

impl StreamError {
    /// Wrap an HTTP status from the stream endpoint
    pub fn from_status(status: StatusCode) -> Self {
        Self::Http { status }
    }

    /// Wrap a transport-level failure that carries no HTTP status
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: cause.to_string(),
        }
    }

    /// The HTTP status, when the failure carries one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status } => Some(*status),
            Self::Transport { .. } => None,
        }
    }

    /// Classify this failure. Only 401 and 403 are unrecoverable: the
    /// credentials are wrong and reconnecting would loop forever. Everything
    /// else, including 408/429/5xx and statusless transport failures, is left
    /// to the transport's own retry loop.
    pub fn kind(&self) -> ErrorKind {
        match self.status() {
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => {
                ErrorKind::Unrecoverable
            }
            _ => ErrorKind::Recoverable,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Recoverable
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Http { status },
            None => Self::transport(err),
        }
    }
}

/// Rejected SDK configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("sdk key must not be empty")]
    MissingSdkKey,

    /// Values that end up in HTTP headers must be visible ASCII
    #[error("{field} contains characters not allowed in an HTTP header")]
    InvalidHeaderValue { field: &'static str },

    #[error("invalid stream URI: {0}")]
    InvalidUri(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses_are_unrecoverable() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = StreamError::from_status(status);
            assert_eq!(err.kind(), ErrorKind::Unrecoverable);
            assert!(!err.is_recoverable());
        }
    }

    #[test]
    fn test_transient_statuses_are_recoverable() {
        for code in [408, 429, 500, 502, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = StreamError::from_status(status);
            assert_eq!(err.kind(), ErrorKind::Recoverable, "status {code}");
        }
    }

    #[test]
    fn test_statusless_errors_are_recoverable() {
        let err = StreamError::transport("connection reset by peer");
        assert_eq!(err.status(), None);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_other_client_statuses_are_recoverable() {
        // Classification only special-cases the two auth statuses
        let err = StreamError::from_status(StatusCode::NOT_FOUND);
        assert!(err.is_recoverable());
    }
}
