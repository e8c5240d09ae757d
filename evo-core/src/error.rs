//! Error conditions raised by strategies, restart controllers and tasks

/// Errors produced while configuring or stepping an optimizer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvoError {
    /// A problem, strategy or parameter value cannot be used as configured
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The restart state constructor was invoked on a controller without one
    #[error("restart strategy is not implemented for this controller")]
    NotImplemented,

    /// A required parameter was absent when the optimizer was initialized
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// A state field the caller relies on does not exist
    #[error("missing state field '{0}'")]
    MissingField(String),

    /// A field exists but holds a different kind of value
    #[error("field '{key}' holds {found}, expected {expected}")]
    TypeMismatch {
        /// Name of the field
        key: String,
        /// Kind of value the caller asked for
        expected: &'static str,
        /// Kind of value stored
        found: &'static str,
    },

    /// Two states that should share a schema disagree on a field
    #[error("state schemas differ at field '{0}'")]
    SchemaMismatch(String),

    /// A batch, fitness vector or parameter vector has the wrong length
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },
}

/// Result type used throughout evo_core
pub type Result<T> = std::result::Result<T, EvoError>;
