//! Error types for chunked sparse matrix operations.

use thiserror::Error;

/// Error type for chunk pattern, matrix and serialization operations.
///
/// Everything except [`ChunkError::Io`] and [`ChunkError::MalformedStream`]
/// is a contract violation: the caller passed arguments the operation cannot
/// accept. Those are checked before any mutation happens.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The matrix has no sparsity pattern bound to it.
    #[error("matrix is not bound to a chunk sparsity pattern")]
    NoPattern,

    /// The matrix has a pattern but no value buffer.
    #[error("matrix values have not been allocated")]
    NotInitialized,

    /// A vector or dense argument has the wrong length.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The operation requires a square matrix.
    #[error("operation is only valid on square matrices, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// Two matrices are bound to different sparsity patterns.
    #[error("matrices are bound to different chunk sparsity patterns")]
    DifferentPatterns,

    /// A logical index lies outside the matrix.
    #[error("index ({row}, {col}) out of range for {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// The chunk containing the entry is not stored in the pattern.
    #[error("entry ({row}, {col}) is not part of the sparsity pattern")]
    EntryNotInPattern { row: usize, col: usize },

    /// An identity descriptor does not match the pattern dimensions.
    #[error("identity of size {size} does not match {rows}x{cols} pattern")]
    IdentityMismatch {
        size: usize,
        rows: usize,
        cols: usize,
    },

    /// Compressed pattern data failed validation.
    #[error("invalid chunk sparsity pattern: {0}")]
    InvalidPattern(String),

    /// The operation exists but has no implementation for chunked storage.
    #[error("{0} is not implemented for chunk sparse matrices")]
    NotImplemented(&'static str),

    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream did not follow the block framing.
    #[error("malformed block stream: {0}")]
    MalformedStream(String),
}

impl ChunkError {
    /// True for stream failures, false for contract violations.
    #[inline]
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::MalformedStream(_))
    }
}

/// Result type for chunked sparse matrix operations.
pub type Result<T> = std::result::Result<T, ChunkError>;
