use thiserror::Error;

/// Failure of one exchange with the crawler's HTTP control surface.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server could not be reached (connect, DNS, timeout, broken body).
    #[error("could not reach the crawler: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a body of the wrong shape.
    #[error("unexpected response from {endpoint}: {detail}")]
    Protocol {
        endpoint: &'static str,
        detail: String,
    },
    /// A control command was answered but not accepted.
    #[error("command not accepted (HTTP {code}): {message}")]
    Acceptance { code: u16, message: String },
    /// The server reported a failure of its own.
    #[error("{message}")]
    Remote { message: String },
}

impl RemoteError {
    pub(crate) fn protocol(endpoint: &'static str, detail: impl ToString) -> Self {
        RemoteError::Protocol {
            endpoint,
            detail: detail.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
