//! Local and derived transform state.
//!
//! A node's transform is split in two: [`LocalTransform`] is the authoritative
//! state clients edit, [`DerivedTransform`] is the world-space result the
//! resolver caches from it. Nothing in the local half depends on the tree.

use cgmath::{Matrix4, Point3, Quaternion, SquareMatrix, Vector3};
use serde::{Deserialize, Serialize};

use crate::common::{trs_matrix, IDENTITY_ROTATION, UNIT_SCALE};

/// The frame of reference a mutator's input is interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Space {
    /// The node's own rotated and scaled axes.
    Local,
    /// The parent's frame, which is the frame local state is stored in.
    Parent,
    /// World space. Equivalent to `Parent` for root nodes.
    World,
}

/// Position, rotation and scale relative to the parent's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub position: Point3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        position: Point3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
        rotation: IDENTITY_ROTATION,
        scale: UNIT_SCALE,
    };

    pub fn new(position: Point3<f32>, rotation: Quaternion<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn with_position(mut self, position: Point3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// Computes the local transform matrix.
    ///
    /// The order of operations is: Translation * Rotation * Scale (TRS)
    pub fn matrix(&self) -> Matrix4<f32> {
        trs_matrix(self.position, self.rotation, self.scale)
    }
}

/// World-space position, rotation and scale, plus the matrix built from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedTransform {
    pub position: Point3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    pub local_to_world: Matrix4<f32>,
}

impl Default for DerivedTransform {
    fn default() -> Self {
        Self {
            position: LocalTransform::IDENTITY.position,
            rotation: IDENTITY_ROTATION,
            scale: UNIT_SCALE,
            local_to_world: Matrix4::identity(),
        }
    }
}

impl DerivedTransform {
    /// Builds a derived transform and its local-to-world matrix.
    pub fn new(position: Point3<f32>, rotation: Quaternion<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
            local_to_world: trs_matrix(position, rotation, scale),
        }
    }
}
