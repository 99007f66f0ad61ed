use std::fmt;

use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur while composing a model.
#[derive(Debug)]
pub enum ComposeError {
    /// Error occurred while loading, decoding or writing a model file
    ModelError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// A linked-model search path segment is not a recognized form
    InvalidSearchPath(String),
    /// Error occurred while evaluating a classifier stage
    PredictionError(String),
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::InvalidSearchPath(msg) => write!(f, "Invalid search path: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
        }
    }
}

impl std::error::Error for ComposeError {}

impl From<ModelError> for ComposeError {
    fn from(err: ModelError) -> Self {
        ComposeError::ModelError(err.to_string())
    }
}
