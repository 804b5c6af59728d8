use oxn_core::DraftError;
use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The call failed; carries the user-facing message.
    #[error("{0}")]
    Request(String),
    #[error("unexpected response shape: {0}")]
    Decode(String),
    #[error("files have not been parsed yet")]
    NotParsed,
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("backend returned {found} ids for {expected} experiments")]
    IdCountMismatch { expected: usize, found: usize },
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
