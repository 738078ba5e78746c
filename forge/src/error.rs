use thiserror::Error;

/// Failure modes surfaced by a `ForgeClient` implementation.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient permissions: {0}")]
    Unauthorized(String),

    #[error("already approved or immutable: {0}")]
    Conflict(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ForgeError {
    /// Maps an HTTP status code to the error kind a real client would
    /// surface, per the 401/404/405 classification a hosted forge returns.
    pub fn from_status(status: u16, body_tail: &str) -> Self {
        match status {
            401 | 403 => ForgeError::Unauthorized(body_tail.to_string()),
            404 => ForgeError::NotFound(body_tail.to_string()),
            405 => ForgeError::Conflict(body_tail.to_string()),
            other => ForgeError::Transport(format!("status {other}: {body_tail}")),
        }
    }
}
