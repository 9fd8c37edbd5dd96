use thiserror::Error;

/// Error types for the reparam-rs library.
#[derive(Error, Debug)]
pub enum ReparamError {
    /// Error indicating a mismatch in vector or array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A parameter name was declared more than once.
    #[error("Parameter '{name}' is declared more than once")]
    DuplicateParameter { name: String },

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// A value fell outside the domain of a constraint transform.
    #[error("Domain violation for parameter '{name}': {message}")]
    DomainViolation { name: String, message: String },

    /// Invalid optimizer options.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Error during model or divergence evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Error raised by the minimizer backend.
    #[error("Optimization failed: {0}")]
    OptimizationFailure(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ReparamError {
    pub(crate) fn domain(name: &str, message: impl Into<String>) -> Self {
        ReparamError::DomainViolation {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for reparam-rs operations.
pub type Result<T> = std::result::Result<T, ReparamError>;
