use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("participants must be two distinct users")]
    InvalidParticipants,

    #[error("not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("send failed after {attempts} attempts: {reason}")]
    SendFailed { attempts: u32, reason: String },
}

impl AppError {
    /// Returns whether this error is transient (e.g., a storage timeout)
    /// and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Storage(_))
    }
}
