//! Error taxonomy for calls against the scoring service.

use thiserror::Error;

/// Every way a leaderboard operation can fail.
///
/// Components never let these escape to the shell as faults; each one
/// converts them into its own short status sentence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Input rejected locally, no request was made
    #[error("{0}")]
    Validation(String),
    /// The service does not know the requested identifier
    #[error("not found")]
    NotFound,
    /// Network unreachable, timed out or the body could not be decoded
    #[error("{0}")]
    Transport(String),
    /// Non-2xx reply, optionally carrying the service's own message
    #[error("server returned status {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },
    /// A submission is already in flight
    #[error("a submission is already in progress")]
    Busy,
}

impl ClientError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// The server-provided message, if the service sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_transient() {
        assert!(ClientError::Transport("connection refused".into()).is_transient());
        assert!(!ClientError::NotFound.is_transient());
        assert!(!ClientError::Validation("bad".into()).is_transient());
        assert!(!ClientError::Server { status: 500, message: None }.is_transient());
    }

    #[test]
    fn test_server_message() {
        let err = ClientError::Server {
            status: 404,
            message: Some("User not found".into()),
        };
        assert_eq!(err.server_message(), Some("User not found"));
        assert_eq!(ClientError::NotFound.server_message(), None);
    }
}
