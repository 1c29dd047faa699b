use cgmath::{Point3, Quaternion, Vector3};
use slotmap::SlotMap;

use crate::config::GraphConfig;
use crate::error::{Result, SceneError};
use crate::event::HierarchyEvent;
use crate::node::{Node, NodeId};
use crate::transform::LocalTransform;
use crate::tree;

/// The container owning every node of a scene hierarchy.
///
/// Nodes live in a generation-checked arena and refer to each other by
/// [`NodeId`]. A parent owns its children: destroying a node destroys its
/// subtree, and moving a node between parents goes through the hierarchy
/// methods ([`SceneGraph::add_child`], [`SceneGraph::set_parent`], ...).
///
/// # Examples
///
/// ```
/// use scenegraph::{SceneGraph, Space};
/// use cgmath::Vector3;
///
/// let mut graph = SceneGraph::new();
/// let root = graph.create_node("root");
/// let arm = graph.create_child(root, "arm").unwrap();
///
/// graph.translate(root, Vector3::new(5.0, 0.0, 0.0), Space::Parent).unwrap();
/// graph.translate(arm, Vector3::new(0.0, 5.0, 0.0), Space::Parent).unwrap();
///
/// let position = graph.derived_position(arm).unwrap();
/// assert_eq!((position.x, position.y, position.z), (5.0, 5.0, 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) roots: Vec<NodeId>,
    events: Vec<HierarchyEvent>,
    config: GraphConfig,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(config.initial_capacity),
            roots: Vec::new(),
            events: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ========== Node Creation ==========

    /// Creates a detached root node with an identity transform.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        self.create_node_with(name, LocalTransform::IDENTITY)
    }

    /// Creates a detached root node with the given local transform.
    ///
    /// The rotation is normalized; a zero or non-finite one becomes identity.
    pub fn create_node_with(&mut self, name: impl Into<String>, local: LocalTransform) -> NodeId {
        let local = self.checked_local(local);
        let id = self.insert_unlinked(Node::new(name.into(), local));
        self.roots.push(id);
        id
    }

    /// Creates a node and attaches it as the last child of `parent`.
    ///
    /// # Errors
    /// Returns [`SceneError::NullArgument`] if `parent` is not a live node.
    pub fn create_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        self.create_child_with(parent, name, LocalTransform::IDENTITY)
    }

    /// Creates a node with the given local transform under `parent`.
    ///
    /// # Errors
    /// Returns [`SceneError::NullArgument`] if `parent` is not a live node.
    pub fn create_child_with(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        local: LocalTransform,
    ) -> Result<NodeId> {
        self.node_checked(parent)?;
        let local = self.checked_local(local);
        let id = self.insert_unlinked(Node::new(name.into(), local));
        self.link(parent, id);
        self.emit(|| HierarchyEvent::Attached { parent, child: id });
        Ok(id)
    }

    /// Inserts a node that is neither a root nor anyone's child yet.
    ///
    /// The caller must link it or push it to the root list before returning
    /// control to users of the graph.
    pub(crate) fn insert_unlinked(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    // ========== Node Access ==========

    /// Gets a reference to a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Gets a mutable reference to a node by ID.
    ///
    /// Only name and visibility can be changed through it; transform and
    /// hierarchy edits go through the graph so the subtree stays consistent.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the parentless nodes in creation/detach order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Iterates over all live nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Destroys every node. Existing handles become stale.
    ///
    /// Queues one [`HierarchyEvent::Destroyed`] per root when recording.
    pub fn clear(&mut self) {
        if self.config.record_events {
            for root in self.roots.clone() {
                let nodes = tree::subtree(self, root);
                self.events.push(HierarchyEvent::Destroyed { parent: None, nodes });
            }
        }
        self.nodes.clear();
        self.roots.clear();
    }

    pub(crate) fn node_checked(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(SceneError::NullArgument(id))
    }

    /// Looks up a node that the hierarchy invariants guarantee to be live.
    ///
    /// A miss means a parent or child link points at a destroyed node, which
    /// is a bug in the hierarchy bookkeeping and not recoverable.
    pub(crate) fn linked(&self, id: NodeId) -> &Node {
        match self.nodes.get(id) {
            Some(node) => node,
            None => panic!("scene graph invariant violated: {id:?} is linked but not live"),
        }
    }

    pub(crate) fn linked_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id) {
            Some(node) => node,
            None => panic!("scene graph invariant violated: {id:?} is linked but not live"),
        }
    }

    // ========== Node Properties ==========

    pub fn name(&self, id: NodeId) -> Result<&str> {
        Ok(self.node_checked(id)?.name())
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.nodes
            .get_mut(id)
            .ok_or(SceneError::NullArgument(id))?
            .set_name(name);
        Ok(())
    }

    pub fn is_visible(&self, id: NodeId) -> Result<bool> {
        Ok(self.node_checked(id)?.is_visible())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.nodes
            .get_mut(id)
            .ok_or(SceneError::NullArgument(id))?
            .set_visible(visible);
        Ok(())
    }

    pub fn local_transform(&self, id: NodeId) -> Result<LocalTransform> {
        Ok(*self.node_checked(id)?.local())
    }

    pub fn local_position(&self, id: NodeId) -> Result<Point3<f32>> {
        Ok(self.node_checked(id)?.position())
    }

    pub fn local_rotation(&self, id: NodeId) -> Result<Quaternion<f32>> {
        Ok(self.node_checked(id)?.rotation())
    }

    pub fn local_scale(&self, id: NodeId) -> Result<Vector3<f32>> {
        Ok(self.node_checked(id)?.scale())
    }

    pub fn is_dirty(&self, id: NodeId) -> Result<bool> {
        Ok(self.node_checked(id)?.is_dirty())
    }

    // ========== Events ==========

    /// Queues the event built by `event` if recording is enabled.
    pub(crate) fn emit(&mut self, event: impl FnOnce() -> HierarchyEvent) {
        if self.config.record_events {
            self.events.push(event());
        }
    }

    /// Events queued since the last drain, oldest first.
    pub fn pending_events(&self) -> &[HierarchyEvent] {
        &self.events
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<HierarchyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Logs a degenerate input that was replaced by a fallback, if enabled.
    pub(crate) fn report_degenerate(&self, error: SceneError, fallback: &str) {
        if self.config.degenerate_warnings {
            log::warn!("{error}; {fallback}");
        }
    }
}
