use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Empty document: {0}")]
    EmptyDocument(String),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),
    #[error("Vector storage error: {0}")]
    Storage(String),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Fatal input errors must be fixed by the caller; re-running the same
    /// operation with the same input cannot succeed.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyDocument(_)
                | Self::InvalidConfig(_)
                | Self::MissingRequiredField(_)
                | Self::Validation(_)
        )
    }
}
