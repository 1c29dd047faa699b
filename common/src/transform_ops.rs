//! Transform operations for manipulating positions, rotations, and scales.
//!
//! This module provides pure mathematical functions used by the scene graph
//! when folding a mutation into a node's local state or composing a node with
//! its parent. Every function that can hit a degenerate input (zero-length
//! axis, zero scale, parallel basis vectors) reports it as `None` instead of
//! producing NaN, so callers decide how to recover.

use cgmath::{
    ElementWise, InnerSpace, Matrix3, Matrix4, Point3, Quaternion, Rad, Rotation, Rotation3,
    Vector3,
};

use super::EPSILON;

/// The identity rotation.
pub const IDENTITY_ROTATION: Quaternion<f32> = Quaternion {
    v: Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    },
    s: 1.0,
};

/// Unit scale on all three axes.
pub const UNIT_SCALE: Vector3<f32> = Vector3 {
    x: 1.0,
    y: 1.0,
    z: 1.0,
};

// =============================================================================
// Composition
// =============================================================================

/// Composes a rotation by applying a new rotation to an existing orientation.
///
/// Applies a parent-frame rotation to an existing orientation (rotation * current).
///
/// # Arguments
/// * `current_rotation` - The current orientation
/// * `rotation` - The rotation to apply (in the parent's frame)
///
/// # Returns
/// The new orientation
pub fn compose_rotation(
    current_rotation: Quaternion<f32>,
    rotation: Quaternion<f32>,
) -> Quaternion<f32> {
    rotation * current_rotation
}

/// Applies component-wise scale to an existing scale vector.
///
/// # Arguments
/// * `current_scale` - The current scale
/// * `scale_factor` - The scale factors to apply (multiplied component-wise)
///
/// # Returns
/// The new scale
pub fn apply_scale(current_scale: Vector3<f32>, scale_factor: Vector3<f32>) -> Vector3<f32> {
    current_scale.mul_element_wise(scale_factor)
}

/// Divides a vector component-wise by a scale.
///
/// Returns `None` if any component of `scale` is too close to zero to invert.
pub fn inverse_scale(vector: Vector3<f32>, scale: Vector3<f32>) -> Option<Vector3<f32>> {
    if scale.x.abs() < EPSILON || scale.y.abs() < EPSILON || scale.z.abs() < EPSILON {
        return None;
    }
    Some(vector.div_element_wise(scale))
}

/// Builds a translation * rotation * scale matrix.
///
/// Scale is applied first, then rotation, then translation.
pub fn trs_matrix(
    position: Point3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,
) -> Matrix4<f32> {
    let translation = Matrix4::from_translation(Vector3::new(position.x, position.y, position.z));
    let rotation = Matrix4::from(rotation);
    let scale = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);

    translation * rotation * scale
}

/// Returns true if all three components are equal within [`EPSILON`].
pub fn is_uniform(scale: Vector3<f32>) -> bool {
    (scale.x - scale.y).abs() < EPSILON && (scale.y - scale.z).abs() < EPSILON
}

/// Returns true if the rotation is the identity (either sign of the quaternion).
pub fn is_identity_rotation(rotation: Quaternion<f32>) -> bool {
    (rotation.s.abs() - 1.0).abs() < EPSILON && rotation.v.magnitude2() < EPSILON
}

/// Scales a rotation back to unit length.
///
/// Returns `None` for a zero-length or non-finite quaternion, which has no
/// meaningful orientation.
pub fn normalize_rotation(rotation: Quaternion<f32>) -> Option<Quaternion<f32>> {
    let finite = rotation.s.is_finite()
        && rotation.v.x.is_finite()
        && rotation.v.y.is_finite()
        && rotation.v.z.is_finite();
    if finite && rotation.magnitude2() >= EPSILON {
        Some(rotation.normalize())
    } else {
        None
    }
}

// =============================================================================
// Axis Computation
// =============================================================================

/// Computes the local X axis (right) for a given orientation.
pub fn local_axis_x(rotation: Quaternion<f32>) -> Vector3<f32> {
    rotation.rotate_vector(Vector3::unit_x())
}

/// Computes the local Y axis (up) for a given orientation.
pub fn local_axis_y(rotation: Quaternion<f32>) -> Vector3<f32> {
    rotation.rotate_vector(Vector3::unit_y())
}

/// Computes the forward direction for a given orientation.
///
/// Forward is local -Z, matching the convention used by [`look_rotation`].
pub fn forward_axis(rotation: Quaternion<f32>) -> Vector3<f32> {
    rotation.rotate_vector(-Vector3::unit_z())
}

/// Computes the (right, up, forward) axes for a given orientation.
pub fn local_axes(rotation: Quaternion<f32>) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
    (
        local_axis_x(rotation),
        local_axis_y(rotation),
        forward_axis(rotation),
    )
}

// =============================================================================
// Quaternion Construction
// =============================================================================

/// Creates a rotation quaternion from an axis and angle.
///
/// The axis does not need to be normalized. Returns `None` if it has
/// near-zero magnitude.
pub fn quaternion_from_axis_angle(axis: Vector3<f32>, angle: Rad<f32>) -> Option<Quaternion<f32>> {
    if axis.magnitude2() > EPSILON {
        Some(Quaternion::from_axis_angle(axis.normalize(), angle))
    } else {
        None
    }
}

/// Rotation about the Y axis.
pub fn yaw_rotation(angle: Rad<f32>) -> Quaternion<f32> {
    Quaternion::from_angle_y(angle)
}

/// Rotation about the X axis.
pub fn pitch_rotation(angle: Rad<f32>) -> Quaternion<f32> {
    Quaternion::from_angle_x(angle)
}

/// Rotation about the Z axis.
pub fn roll_rotation(angle: Rad<f32>) -> Quaternion<f32> {
    Quaternion::from_angle_z(angle)
}

/// Computes the orientation whose forward axis (-Z) points along `forward`,
/// keeping its up axis as close to `up` as possible.
///
/// Returns `None` when `forward` or `up` has near-zero length, or when they
/// are parallel.
pub fn look_rotation(forward: Vector3<f32>, up: Vector3<f32>) -> Option<Quaternion<f32>> {
    if forward.magnitude2() < EPSILON || up.magnitude2() < EPSILON {
        return None;
    }

    let back = -forward.normalize();
    let right = up.normalize().cross(back);
    if right.magnitude2() < EPSILON {
        return None;
    }
    let right = right.normalize();
    let up = back.cross(right);

    Some(Quaternion::from(Matrix3::from_cols(right, up, back)).normalize())
}
