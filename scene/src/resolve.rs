//! Derived transform resolution.
//!
//! Two entry points share one composition rule. The derived accessors pull:
//! they walk up to the nearest clean ancestor and recompute the dirty chain
//! top-down. [`SceneGraph::update_world_transforms`] sweeps every tree once
//! per frame, after which the `&self` readers see a fully clean graph.

use cgmath::{EuclideanSpace, Matrix4, Point3, Quaternion, Rotation, Vector3};

use crate::common::{apply_scale, local_axes};
use crate::error::Result;
use crate::graph::SceneGraph;
use crate::node::{DirtyFlags, Node, NodeId};
use crate::transform::DerivedTransform;
use crate::tree::{walk_all, TreeVisitor};

/// Composes a node's local state onto its parent's derived transform.
///
/// Position always goes through the parent's full transform; the inherit
/// flags only decide whether rotation and scale accumulate.
fn compose(parent: Option<&DerivedTransform>, node: &Node) -> DerivedTransform {
    let local = node.local();
    let Some(parent) = parent else {
        return DerivedTransform::new(local.position, local.rotation, local.scale);
    };

    let rotation = if node.inherit_rotation() {
        parent.rotation * local.rotation
    } else {
        local.rotation
    };
    let scale = if node.inherit_scale() {
        apply_scale(parent.scale, local.scale)
    } else {
        local.scale
    };
    let offset = parent
        .rotation
        .rotate_vector(apply_scale(parent.scale, local.position.to_vec()));

    DerivedTransform::new(parent.position + offset, rotation, scale)
}

impl SceneGraph {
    /// Brings the derived transform of `id` up to date and returns it.
    ///
    /// Only the dirty part of the ancestor chain is recomputed. Dirty
    /// siblings and descendants are left for later.
    pub(crate) fn resolve(&mut self, id: NodeId) -> Result<DerivedTransform> {
        let node = self.node_checked(id)?;
        if let Some(derived) = node.cached_derived() {
            return Ok(*derived);
        }

        // Dirty closure: everything between `id` and the first clean
        // ancestor is dirty, and everything above that is clean.
        let mut chain = vec![id];
        let mut base = None;
        let mut current = node.parent();
        while let Some(parent_id) = current {
            let parent = self.linked(parent_id);
            if let Some(derived) = parent.cached_derived() {
                base = Some(*derived);
                break;
            }
            chain.push(parent_id);
            if chain.len() > self.nodes.len() {
                panic!("scene graph invariant violated: cycle above {id:?}");
            }
            current = parent.parent();
        }

        log::trace!("resolving {} dirty nodes for {id:?}", chain.len());

        let mut derived = DerivedTransform::default();
        for &node_id in chain.iter().rev() {
            let node = self.linked_mut(node_id);
            derived = compose(base.as_ref(), node);
            node.store_derived(derived);
            base = Some(derived);
        }

        Ok(derived)
    }

    /// Recomputes every dirty node of the graph, roots first.
    ///
    /// Intended to run once per frame before the renderer reads
    /// [`SceneGraph::resolved_world_matrix`] or [`SceneGraph::world_matrices`].
    /// Returns how many nodes were recomputed.
    pub fn update_world_transforms(&mut self) -> usize {
        let stack = self.roots.iter().rev().map(|&id| (id, None)).collect();
        let recomputed = self.sweep(stack);

        log::trace!("world transform sweep recomputed {recomputed} of {} nodes", self.len());
        recomputed
    }

    /// Recomputes every dirty node in the subtree rooted at `id`.
    pub fn resolve_subtree(&mut self, id: NodeId) -> Result<usize> {
        let was_dirty = self.node_checked(id)?.is_dirty();
        let derived = self.resolve(id)?;

        let stack = self
            .linked(id)
            .children()
            .iter()
            .rev()
            .map(|&child| (child, Some(derived)))
            .collect();
        let below = self.sweep(stack);

        Ok(below + usize::from(was_dirty))
    }

    fn sweep(&mut self, mut stack: Vec<(NodeId, Option<DerivedTransform>)>) -> usize {
        let mut recomputed = 0;

        while let Some((id, parent)) = stack.pop() {
            let node = self.linked_mut(id);
            let derived = match node.cached_derived().copied() {
                Some(derived) => derived,
                None => {
                    let derived = compose(parent.as_ref(), node);
                    node.store_derived(derived);
                    recomputed += 1;
                    derived
                }
            };
            stack.extend(node.children().iter().rev().map(|&child| (child, Some(derived))));
        }

        recomputed
    }

    // ========== Resolving Accessors ==========

    pub fn derived_transform(&mut self, id: NodeId) -> Result<DerivedTransform> {
        self.resolve(id)
    }

    pub fn derived_position(&mut self, id: NodeId) -> Result<Point3<f32>> {
        Ok(self.resolve(id)?.position)
    }

    pub fn derived_rotation(&mut self, id: NodeId) -> Result<Quaternion<f32>> {
        Ok(self.resolve(id)?.rotation)
    }

    pub fn derived_scale(&mut self, id: NodeId) -> Result<Vector3<f32>> {
        Ok(self.resolve(id)?.scale)
    }

    /// Gets the local-to-world matrix, `T * R * S` of the derived state.
    pub fn world_matrix(&mut self, id: NodeId) -> Result<Matrix4<f32>> {
        Ok(self.resolve(id)?.local_to_world)
    }

    /// Gets the node's world-space (right, up, forward) axes. Forward is -Z.
    pub fn world_axes(&mut self, id: NodeId) -> Result<(Vector3<f32>, Vector3<f32>, Vector3<f32>)> {
        Ok(local_axes(self.resolve(id)?.rotation))
    }

    pub fn dirty_flags(&self, id: NodeId) -> Result<DirtyFlags> {
        Ok(self.node_checked(id)?.dirty_flags())
    }

    // ========== Renderer Readers ==========

    /// Gets the cached derived transform without resolving.
    ///
    /// `None` if the node is not live or has not been resolved since its
    /// last change.
    pub fn resolved_transform(&self, id: NodeId) -> Option<DerivedTransform> {
        self.nodes.get(id)?.cached_derived().copied()
    }

    /// Gets the cached local-to-world matrix without resolving.
    pub fn resolved_world_matrix(&self, id: NodeId) -> Option<Matrix4<f32>> {
        self.resolved_transform(id)
            .map(|derived| derived.local_to_world)
    }

    /// Collects the matrices of visible, resolved nodes in tree order.
    ///
    /// Call [`SceneGraph::update_world_transforms`] first; dirty nodes are
    /// left out.
    pub fn world_matrices(&self) -> Vec<(NodeId, Matrix4<f32>)> {
        struct Matrices(Vec<(NodeId, Matrix4<f32>)>);

        impl TreeVisitor for Matrices {
            fn enter_node(&mut self, id: NodeId, node: &Node) -> bool {
                if node.is_visible() {
                    if let Some(derived) = node.cached_derived() {
                        self.0.push((id, derived.local_to_world));
                    }
                }
                true
            }
        }

        let mut matrices = Matrices(Vec::with_capacity(self.len()));
        walk_all(self, &mut matrices);
        matrices.0
    }
}
