use std::fmt;

use async_trait::async_trait;

use super::types::{ChatReply, SessionIds, StagedFile, UploadReply};

/// Errors that can occur while talking to the chat backend.
/// None of them are retried; each ends up as a line in the display log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never completed (connection refused, DNS, reset).
    Transport(String),
    /// The backend answered with a non-success status.
    Status { status: u16, message: String },
    /// A success response whose body is not what the endpoint promises.
    Parse(String),
    /// A staged file could not be read from disk.
    Io(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "network error: {msg}"),
            BackendError::Status { status, message } => {
                write!(f, "backend error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "unexpected response: {msg}"),
            BackendError::Io(msg) => write!(f, "file error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// The two calls a chat backend exposes.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the name of the backend, for logs.
    fn name(&self) -> &str;

    /// Uploads a file, forwarding whichever session ids are already known.
    async fn upload(
        &self,
        file: &StagedFile,
        ids: &SessionIds,
    ) -> Result<UploadReply, BackendError>;

    /// Sends one user message under the current session ids.
    async fn chat(&self, message: &str, ids: &SessionIds) -> Result<ChatReply, BackendError>;
}
