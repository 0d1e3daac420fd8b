use thiserror::Error;
use vector_data::MarkupError;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),
    #[error("Malformed path data: {0}")]
    MalformedPathData(String),
    #[error("Can't morph from {from} to {to}")]
    IncompatiblePathMorph { from: String, to: String },
    #[error("Target with the name {0} cannot be found in the vector drawable")]
    UnresolvedAnimationTarget(String),
    #[error("Target {0} is not a group or a path and cannot be animated")]
    UnsupportedAnimationTarget(String),
    #[error("Value type of {0} cannot be determined")]
    UndefinedValueType(String),
    #[error("Animated vector is missing its drawable attribute")]
    MissingDrawable,
    #[error("Invalid attribute {name}: {message}")]
    InvalidAttribute { name: String, message: String },
    #[error(transparent)]
    Resource(#[from] MarkupError),
}

pub type Result<T> = std::result::Result<T, VectorError>;
