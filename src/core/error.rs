//! Core error types for enumeration

use thiserror::Error;

/// Error types for lattice enumeration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LatticeError {
    /// Empty or inverted index range, or a range past the basis dimension
    #[error("Invalid range: [{first}, {last}) in dimension {dimension}")]
    InvalidRange {
        first: usize,
        last: usize,
        dimension: usize,
    },

    /// Fixed coordinate prefix does not fit in the enumerated range
    #[error("Subtree of length {len} does not fit in a range of {range} levels")]
    SubtreeTooLong { len: usize, range: usize },

    /// Parallel split level leaves an empty top or bottom region
    #[error("Split level {split} out of bounds, must lie in [{min}, {max}]")]
    SplitOutOfBounds { split: usize, min: usize, max: usize },

    /// Input vector has the wrong length
    #[error("Dimension mismatch for {what}: expected at least {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Operation not supported
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// High precision arithmetic error
    #[error("Precision error: {0}")]
    PrecisionError(String),

    /// Worker thread could not be spawned or panicked
    #[error("Worker error: {0}")]
    WorkerError(String),

    /// Custom error with message
    #[error("Error: {0}")]
    Custom(String),
}

/// Result type for enumeration operations
pub type Result<T> = std::result::Result<T, LatticeError>;

impl LatticeError {
    /// Create a custom error with the given message
    pub fn custom(msg: impl Into<String>) -> Self {
        LatticeError::Custom(msg.into())
    }

    /// Create an invalid range error
    pub fn invalid_range(first: usize, last: usize, dimension: usize) -> Self {
        LatticeError::InvalidRange {
            first,
            last,
            dimension,
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        LatticeError::DimensionMismatch {
            what,
            expected,
            found,
        }
    }

    /// Create an invalid parameters error
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        LatticeError::InvalidParameters(msg.into())
    }

    /// Create a not supported error
    pub fn not_supported(msg: impl Into<String>) -> Self {
        LatticeError::NotSupported(msg.into())
    }

    /// Create a precision error
    pub fn precision_error(msg: impl Into<String>) -> Self {
        LatticeError::PrecisionError(msg.into())
    }

    /// Create a worker error
    pub fn worker_error(msg: impl Into<String>) -> Self {
        LatticeError::WorkerError(msg.into())
    }

    /// Whether the error was raised by argument validation, before any search started
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LatticeError::InvalidRange { .. }
                | LatticeError::SubtreeTooLong { .. }
                | LatticeError::SplitOutOfBounds { .. }
                | LatticeError::DimensionMismatch { .. }
                | LatticeError::InvalidParameters(_)
                | LatticeError::NotSupported(_)
        )
    }
}
