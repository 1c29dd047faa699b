//! Math helpers shared by the scene graph crates.
//!
//! The vector, quaternion and matrix types themselves come from `cgmath`;
//! this crate only adds the transform operations the graph needs on top.

pub mod transform_ops;

pub use transform_ops::*;

/// Tolerance used for degenerate-geometry checks and approximate comparisons.
pub const EPSILON: f32 = 1e-6;
