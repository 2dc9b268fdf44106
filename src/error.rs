use thiserror::Error;

/// Local, recoverable failures of kernel operations.
///
/// None of these abort a traversal: callers skip the affected cell or
/// triangulation and carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// The vertices do not span a plane (all coincident or colinear).
    #[error("Polygon normal is degenerate")]
    DegenerateNormal,

    /// Not enough vertices for the requested primitive.
    #[error("Expected at least {expected} points, found {found}")]
    TooFewPoints {
        /// Minimum number of points required.
        expected: usize,
        /// Number of points supplied.
        found: usize,
    },

    /// Ear cutting ran out of valid ears.
    #[error("Ear cutting stalled with {remaining} vertices left")]
    TriangulationFailed {
        /// Vertices left in the working loop when the queue emptied.
        remaining: usize,
    },

    /// The point cloud has no well-defined best-fit plane.
    #[error("Points do not define a unique best-fit plane")]
    DegeneratePlaneFit,

    /// A selection loop was evaluated without any loop points.
    #[error("Selection loop has no points")]
    EmptyLoop,
}
