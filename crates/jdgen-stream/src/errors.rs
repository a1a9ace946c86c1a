use reqwest::StatusCode;

/// Errors surfaced while establishing a stream, before any event is emitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Server answered with a non-success status.
    #[error("HTTP {status}")]
    Http { status: u16 },
    /// Request or stream I/O failed.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl StreamError {
    pub(crate) fn http(status: StatusCode) -> Self {
        Self::Http {
            status: status.as_u16(),
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Terminal failure delivered through `StreamEvent::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum StreamFailure {
    /// Server answered with a non-success status before streaming began.
    #[error("HTTP {status}")]
    Http { status: u16 },
    /// Network or stream read failed mid-session.
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// The server sent an `error` event.
    #[error("{message}")]
    Server { message: String },
    /// Event sequencing violated the stream contract.
    #[error("protocol failure: {message}")]
    Protocol { message: String },
    /// The session was cancelled by the caller.
    #[error("stream cancelled")]
    Cancelled,
}

impl StreamFailure {
    /// True when the failure is a caller-initiated cancellation, which must
    /// never surface as a user-facing error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<&StreamError> for StreamFailure {
    fn from(err: &StreamError) -> Self {
        match err {
            StreamError::Http { status } => Self::Http { status: *status },
            StreamError::Transport { message } => Self::Transport {
                message: message.clone(),
            },
            StreamError::Config(message) => Self::Protocol {
                message: message.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_contains_status() {
        assert_eq!(StreamError::Http { status: 500 }.to_string(), "HTTP 500");
        assert_eq!(StreamFailure::Http { status: 404 }.to_string(), "HTTP 404");
    }

    #[test]
    fn server_failure_displays_raw_message() {
        let failure = StreamFailure::Server {
            message: "boom".into(),
        };
        assert_eq!(failure.to_string(), "boom");
    }

    #[test]
    fn only_cancelled_is_cancelled() {
        assert!(StreamFailure::Cancelled.is_cancelled());
        assert!(!StreamFailure::Http { status: 500 }.is_cancelled());
    }
}
