//! Error types for scene graph operations.

use thiserror::Error;

use crate::node::NodeId;
use crate::transform::Space;

/// Errors reported by [`crate::SceneGraph`] operations.
///
/// Structural errors leave the graph exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// Cycle attempt, re-adding an existing child, or removing a non-child
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// The handle does not refer to a live node (never created or destroyed)
    #[error("Node {0:?} does not exist in the scene graph")]
    NullArgument(NodeId),

    /// Zero-length direction or axis, or a zero scale that cannot be inverted
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    #[error("{operation} is not supported in {space:?} space")]
    UnsupportedSpace {
        operation: &'static str,
        space: Space,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Result type alias using [`SceneError`].
pub type Result<T> = std::result::Result<T, SceneError>;
