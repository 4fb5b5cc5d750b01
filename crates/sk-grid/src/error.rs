//! Error types for grid operations.

use sk_core::Position;

/// Errors that can occur while building or querying a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Width or height is zero or negative.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },

    /// A position lies outside the grid.
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    /// A position is an obstacle cell.
    #[error("position {0} is an obstacle")]
    Obstacle(Position),
}

/// Convenience result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
