use bitflags::bitflags;
use cgmath::{Point3, Quaternion, Vector3};
use slotmap::new_key_type;

use crate::transform::{DerivedTransform, LocalTransform};

new_key_type! {
    /// Generation-checked handle to a node in a [`crate::SceneGraph`].
    ///
    /// Handles to destroyed nodes are never reused for a different node.
    pub struct NodeId;
}

bitflags! {
    /// Why a node's cached derived transform is stale.
    ///
    /// The empty set means the cache is valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// Local position changed
        const POSITION = 1 << 0;
        /// Local rotation or rotation inheritance changed
        const ROTATION = 1 << 1;
        /// Local scale or scale inheritance changed
        const SCALE = 1 << 2;
        /// An ancestor changed, or the node was attached or detached
        const PARENT = 1 << 3;

        const LOCAL = Self::POSITION.bits() | Self::ROTATION.bits() | Self::SCALE.bits();
    }
}

/// Cached resolver output. Only meaningful while `dirty` is empty.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransformCache {
    dirty: DirtyFlags,
    derived: DerivedTransform,
}

/// A node in the scene hierarchy.
///
/// Local state is edited through [`crate::SceneGraph`], which keeps the
/// hierarchy and the dirty marks of the subtree consistent.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,

    // Local transform components
    local: LocalTransform,
    inherit_rotation: bool,
    inherit_scale: bool,

    visible: bool,

    // Hierarchy
    parent: Option<NodeId>,
    children: Vec<NodeId>,

    cache: TransformCache,
}

impl Node {
    /// Creates a detached node with the given local transform.
    ///
    /// The node starts dirty since nothing has been resolved for it yet.
    pub(crate) fn new(name: String, local: LocalTransform) -> Self {
        Self {
            name,
            local,
            inherit_rotation: true,
            inherit_scale: true,
            visible: true,
            parent: None,
            children: Vec::new(),
            cache: TransformCache {
                dirty: DirtyFlags::all(),
                derived: DerivedTransform::default(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Visibility is carried for the renderer and has no effect on transforms.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // Getters for transform components

    pub fn local(&self) -> &LocalTransform {
        &self.local
    }

    pub fn position(&self) -> Point3<f32> {
        self.local.position
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.local.rotation
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.local.scale
    }

    pub fn inherit_rotation(&self) -> bool {
        self.inherit_rotation
    }

    pub fn inherit_scale(&self) -> bool {
        self.inherit_scale
    }

    // Setters used by the graph; callers are responsible for marking the subtree

    pub(crate) fn set_local(&mut self, local: LocalTransform) {
        self.local = local;
    }

    pub(crate) fn set_position(&mut self, position: Point3<f32>) {
        self.local.position = position;
    }

    pub(crate) fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.local.rotation = rotation;
    }

    pub(crate) fn set_scale(&mut self, scale: Vector3<f32>) {
        self.local.scale = scale;
    }

    pub(crate) fn set_inherit_rotation(&mut self, inherit: bool) {
        self.inherit_rotation = inherit;
    }

    pub(crate) fn set_inherit_scale(&mut self, inherit: bool) {
        self.inherit_scale = inherit;
    }

    // Hierarchy management

    /// Gets the parent node ID.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Gets the list of child node IDs, in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Sets the parent node ID (internal use only - use SceneGraph methods to maintain consistency).
    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Appends a child node ID (internal use only - use SceneGraph methods to maintain consistency).
    pub(crate) fn push_child(&mut self, child: NodeId) {
        debug_assert!(!self.children.contains(&child));
        self.children.push(child);
    }

    /// Removes a child node ID, keeping the order of the remaining children.
    ///
    /// Returns the index the child was at, if it was present.
    pub(crate) fn remove_child(&mut self, child: NodeId) -> Option<usize> {
        let index = self.children.iter().position(|&id| id == child)?;
        self.children.remove(index);
        Some(index)
    }

    pub(crate) fn take_children(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.children)
    }

    // Cache state

    pub fn dirty_flags(&self) -> DirtyFlags {
        self.cache.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.cache.dirty.is_empty()
    }

    /// Gets the cached derived transform, if it is valid.
    /// You probably want [crate::SceneGraph::derived_transform]
    pub fn cached_derived(&self) -> Option<&DerivedTransform> {
        if self.is_dirty() {
            None
        } else {
            Some(&self.cache.derived)
        }
    }

    /// Adds dirty marks. Returns true if the node was clean before.
    pub(crate) fn mark_dirty(&mut self, flags: DirtyFlags) -> bool {
        let was_clean = !self.is_dirty();
        self.cache.dirty |= flags;
        was_clean
    }

    /// Stores freshly resolved derived state and marks the node clean.
    pub(crate) fn store_derived(&mut self, derived: DerivedTransform) {
        self.cache.derived = derived;
        self.cache.dirty = DirtyFlags::empty();
    }
}
