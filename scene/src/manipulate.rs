//! Transform mutators.
//!
//! Every mutator folds its input into the node's local state, then marks the
//! node and its subtree dirty. World-space inputs are converted through the
//! derived state of the node or its parent, so those resolve first.

use cgmath::{EuclideanSpace, Point3, Quaternion, Rad, Rotation, Vector3};

use crate::common::{
    apply_scale, compose_rotation, inverse_scale, is_identity_rotation, is_uniform, look_rotation,
    normalize_rotation, pitch_rotation, quaternion_from_axis_angle, roll_rotation, yaw_rotation,
    IDENTITY_ROTATION, UNIT_SCALE,
};
use crate::error::{Result, SceneError};
use crate::graph::SceneGraph;
use crate::node::{DirtyFlags, Node, NodeId};
use crate::transform::{LocalTransform, Space};

impl SceneGraph {
    /// Applies `edit` to a live node and marks it with `flags`.
    fn edit_local(&mut self, id: NodeId, flags: DirtyFlags, edit: impl FnOnce(&mut Node)) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::NullArgument(id))?;
        edit(node);
        self.mark_dirty(id, flags);
        Ok(())
    }

    /// Normalizes a rotation, falling back to identity for a zero or
    /// non-finite quaternion.
    pub(crate) fn checked_rotation(&self, rotation: Quaternion<f32>) -> Quaternion<f32> {
        normalize_rotation(rotation).unwrap_or_else(|| {
            self.report_degenerate(
                SceneError::DegenerateGeometry("zero-length or non-finite rotation quaternion"),
                "using identity rotation",
            );
            IDENTITY_ROTATION
        })
    }

    /// Same as [`SceneGraph::checked_rotation`] for a whole local transform.
    ///
    /// Every rotation entering local state goes through here.
    pub(crate) fn checked_local(&self, local: LocalTransform) -> LocalTransform {
        local.with_rotation(self.checked_rotation(local.rotation))
    }

    // ========== Position ==========

    pub fn set_position(&mut self, id: NodeId, position: Point3<f32>) -> Result<()> {
        self.edit_local(id, DirtyFlags::POSITION, |node| node.set_position(position))
    }

    /// Moves the node by `offset`, interpreted in `space`.
    ///
    /// In [`Space::World`] the offset is brought into the parent's frame
    /// through the parent's derived rotation and scale. If the parent's scale
    /// has a zero component the offset cannot be mapped and is ignored.
    pub fn translate(&mut self, id: NodeId, offset: Vector3<f32>, space: Space) -> Result<()> {
        let node = self.node_checked(id)?;
        let local_offset = match (space, node.parent()) {
            (Space::Local, _) => node.rotation().rotate_vector(apply_scale(node.scale(), offset)),
            (Space::Parent, _) | (Space::World, None) => offset,
            (Space::World, Some(parent)) => {
                let parent = self.resolve(parent)?;
                let unrotated = parent.rotation.conjugate().rotate_vector(offset);
                match inverse_scale(unrotated, parent.scale) {
                    Some(local_offset) => local_offset,
                    None => {
                        self.report_degenerate(
                            SceneError::DegenerateGeometry("parent scale has a zero component"),
                            "world-space translation ignored",
                        );
                        return Ok(());
                    }
                }
            }
        };

        self.edit_local(id, DirtyFlags::POSITION, |node| {
            node.set_position(node.position() + local_offset)
        })
    }

    // ========== Rotation ==========

    /// Replaces the local rotation. Accepts quaternions and `cgmath::Euler` angles.
    pub fn set_rotation(&mut self, id: NodeId, rotation: impl Into<Quaternion<f32>>) -> Result<()> {
        self.node_checked(id)?;
        let rotation = self.checked_rotation(rotation.into());
        self.edit_local(id, DirtyFlags::ROTATION, |node| node.set_rotation(rotation))
    }

    /// Applies `rotation` on top of the current orientation, interpreted in `space`.
    pub fn rotate(&mut self, id: NodeId, rotation: impl Into<Quaternion<f32>>, space: Space) -> Result<()> {
        let rotation = rotation.into();
        let current = self.node_checked(id)?.rotation();

        let rotated = match space {
            Space::Local => current * rotation,
            Space::Parent => compose_rotation(current, rotation),
            Space::World => {
                // Conjugate into the node's own frame so the derived result is
                // `rotation * derived`
                let derived = self.resolve(id)?.rotation;
                current * derived.conjugate() * rotation * derived
            }
        };

        let rotated = self.checked_rotation(rotated);
        self.edit_local(id, DirtyFlags::ROTATION, |node| node.set_rotation(rotated))
    }

    /// Rotates about the Y axis of `space`.
    pub fn yaw(&mut self, id: NodeId, angle: impl Into<Rad<f32>>, space: Space) -> Result<()> {
        self.rotate(id, yaw_rotation(angle.into()), space)
    }

    /// Rotates about the X axis of `space`.
    pub fn pitch(&mut self, id: NodeId, angle: impl Into<Rad<f32>>, space: Space) -> Result<()> {
        self.rotate(id, pitch_rotation(angle.into()), space)
    }

    /// Rotates about the Z axis of `space`.
    pub fn roll(&mut self, id: NodeId, angle: impl Into<Rad<f32>>, space: Space) -> Result<()> {
        self.rotate(id, roll_rotation(angle.into()), space)
    }

    /// Rotates about an arbitrary axis of `space`. A zero axis is a no-op.
    pub fn rotate_axis_angle(
        &mut self,
        id: NodeId,
        axis: Vector3<f32>,
        angle: impl Into<Rad<f32>>,
        space: Space,
    ) -> Result<()> {
        self.node_checked(id)?;
        match quaternion_from_axis_angle(axis, angle.into()) {
            Some(rotation) => self.rotate(id, rotation, space),
            None => {
                self.report_degenerate(
                    SceneError::DegenerateGeometry("zero-length rotation axis"),
                    "rotation ignored",
                );
                Ok(())
            }
        }
    }

    /// Sets the rotation the node should end up with in world space.
    ///
    /// For a node that does not inherit rotation this is the local rotation.
    pub fn set_world_rotation(&mut self, id: NodeId, rotation: Quaternion<f32>) -> Result<()> {
        let node = self.node_checked(id)?;
        let local = match node.parent() {
            Some(parent) if node.inherit_rotation() => {
                self.resolve(parent)?.rotation.conjugate() * rotation
            }
            _ => rotation,
        };
        self.set_rotation(id, local)
    }

    /// Turns the node so its forward axis (-Z) points at `target`.
    ///
    /// If `target` coincides with the node's position, or the direction is
    /// parallel to `up`, the node gets the identity world rotation.
    pub fn look_at(&mut self, id: NodeId, target: Point3<f32>, up: Vector3<f32>) -> Result<()> {
        let position = self.resolve(id)?.position;

        let rotation = match look_rotation(target - position, up) {
            Some(rotation) => rotation,
            None => {
                self.report_degenerate(
                    SceneError::DegenerateGeometry("look direction is zero or parallel to up"),
                    "using identity rotation",
                );
                IDENTITY_ROTATION
            }
        };

        self.set_world_rotation(id, rotation)
    }

    // ========== Scale ==========

    pub fn set_scale(&mut self, id: NodeId, scale: Vector3<f32>) -> Result<()> {
        self.edit_local(id, DirtyFlags::SCALE, |node| node.set_scale(scale))
    }

    /// Multiplies the local scale by `factor` on every axis.
    pub fn scale_uniform(&mut self, id: NodeId, factor: f32) -> Result<()> {
        self.scale(id, Vector3::new(factor, factor, factor), Space::Local)
    }

    /// Multiplies the scale component-wise by `factor`, interpreted in `space`.
    ///
    /// Scale always acts along the node's own axes. A non-uniform factor along
    /// world axes is only representable while the node's derived rotation is
    /// the identity; otherwise it fails with [`SceneError::UnsupportedSpace`].
    pub fn scale(&mut self, id: NodeId, factor: Vector3<f32>, space: Space) -> Result<()> {
        self.node_checked(id)?;

        if space == Space::World && !is_uniform(factor) {
            let derived = self.resolve(id)?;
            if !is_identity_rotation(derived.rotation) {
                return Err(SceneError::UnsupportedSpace {
                    operation: "non-uniform scale",
                    space,
                });
            }
        }

        self.edit_local(id, DirtyFlags::SCALE, |node| {
            node.set_scale(apply_scale(node.scale(), factor))
        })
    }

    // ========== Reset and Bulk ==========

    pub fn reset_position(&mut self, id: NodeId) -> Result<()> {
        self.set_position(id, Point3::origin())
    }

    pub fn reset_rotation(&mut self, id: NodeId) -> Result<()> {
        self.edit_local(id, DirtyFlags::ROTATION, |node| node.set_rotation(IDENTITY_ROTATION))
    }

    pub fn reset_scale(&mut self, id: NodeId) -> Result<()> {
        self.set_scale(id, UNIT_SCALE)
    }

    /// Resets position, rotation and scale to identity.
    pub fn reset_all(&mut self, id: NodeId) -> Result<()> {
        self.set_local_transform(id, LocalTransform::IDENTITY)
    }

    pub fn set_local_transform(&mut self, id: NodeId, local: LocalTransform) -> Result<()> {
        self.node_checked(id)?;
        let local = self.checked_local(local);
        self.edit_local(id, DirtyFlags::LOCAL, |node| node.set_local(local))
    }

    // ========== Inheritance ==========

    pub fn set_inherit_rotation(&mut self, id: NodeId, inherit: bool) -> Result<()> {
        if self.node_checked(id)?.inherit_rotation() == inherit {
            return Ok(());
        }
        self.edit_local(id, DirtyFlags::ROTATION, |node| node.set_inherit_rotation(inherit))
    }

    pub fn set_inherit_scale(&mut self, id: NodeId, inherit: bool) -> Result<()> {
        if self.node_checked(id)?.inherit_scale() == inherit {
            return Ok(());
        }
        self.edit_local(id, DirtyFlags::SCALE, |node| node.set_inherit_scale(inherit))
    }
}
