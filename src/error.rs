//! Error types for board construction, serialization, and queries.

use thiserror::Error;

/// Errors from building or serializing a single board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Width or generation count is below the 1-cell minimum.
    #[error("invalid board dimensions {width}x{generations}, both must be at least 1")]
    InvalidDimensions { width: usize, generations: usize },

    /// The packed seed does not carry enough bits to cover the board width.
    #[error("seed provides {available} bits but the board is {width} cells wide")]
    InvalidSeed { available: usize, width: usize },

    /// A flat stream was requested with too small an element size.
    #[error("element width {requested} is below the minimum of {minimum}")]
    InvalidElementWidth { requested: usize, minimum: usize },
}

/// Errors from constructing a query engine or reading its results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// No run batches were supplied to reduce over.
    #[error("no run batches supplied")]
    EmptyInput,

    /// A batch's dimensions differ from the first batch's.
    #[error("batch {index} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Results were requested before the reduction finished.
    #[error("query results are not ready")]
    NotReady,

    /// The requested result index does not exist.
    #[error("no query result at index {0}")]
    IndexNotFound(usize),
}
