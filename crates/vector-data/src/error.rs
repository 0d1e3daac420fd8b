use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("Malformed markup at {position}: {message}")]
    Malformed { position: String, message: String },
    #[error("Unexpected end of document")]
    UnexpectedEnd,
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),
    #[error("Invalid display metrics: {0}")]
    Metrics(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
