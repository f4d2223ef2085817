//! Error types for the arithmetic operations.

/// A business-rule failure raised by an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// The input is outside the domain of the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A mean was requested over zero elements.
    #[error("division by zero: {0}")]
    DivisionByZero(String),
}
