//! Detached copies of a subtree's local state.
//!
//! A [`GraphSnapshot`] stores nodes in pre-order with the captured root at
//! index 0; children refer to later entries by index. Only local state is
//! captured, derived state is recomputed after instantiation.
//!
//! # Byte layout
//!
//! ```text
//! [magic: 4 bytes "SGSN"][version: u16 LE][bincode body]
//! ```

use cgmath::{Point3, Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

use crate::common::normalize_rotation;
use crate::error::{Result, SceneError};
use crate::event::HierarchyEvent;
use crate::graph::SceneGraph;
use crate::node::{Node, NodeId};
use crate::transform::LocalTransform;
use crate::tree;

pub const MAGIC: [u8; 4] = *b"SGSN";

/// Snapshot format version: major in the high byte, minor in the low byte.
pub const VERSION: u16 = 0x0001; // 0.1

const HEADER_LEN: usize = MAGIC.len() + std::mem::size_of::<u16>();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub position: [f32; 3],
    /// Quaternion as [x, y, z, w]
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub inherit_rotation: bool,
    pub inherit_scale: bool,
    pub visible: bool,
    /// Indices into [`GraphSnapshot::nodes`], in child order
    pub children: Vec<u32>,
}

impl NodeSnapshot {
    fn from_node(node: &Node, children: Vec<u32>) -> Self {
        let position = node.position();
        let rotation = node.rotation();
        let scale = node.scale();

        // cgmath Quaternion: s is scalar (w), v is Vector3 (x, y, z)
        Self {
            name: node.name().to_string(),
            position: [position.x, position.y, position.z],
            rotation: [rotation.v.x, rotation.v.y, rotation.v.z, rotation.s],
            scale: [scale.x, scale.y, scale.z],
            inherit_rotation: node.inherit_rotation(),
            inherit_scale: node.inherit_scale(),
            visible: node.is_visible(),
            children,
        }
    }

    pub fn local_transform(&self) -> LocalTransform {
        let [x, y, z, w] = self.rotation;
        LocalTransform::new(
            Point3::from(self.position),
            Quaternion::new(w, x, y, z),
            Vector3::from(self.scale),
        )
    }

    fn to_node(&self, local: LocalTransform) -> Node {
        let mut node = Node::new(self.name.clone(), local);
        node.set_inherit_rotation(self.inherit_rotation);
        node.set_inherit_scale(self.inherit_scale);
        node.set_visible(self.visible);
        node
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
}

impl GraphSnapshot {
    /// Captures the subtree rooted at `root`.
    pub fn capture(graph: &SceneGraph, root: NodeId) -> Result<Self> {
        graph.node_checked(root)?;

        let order = tree::subtree(graph, root);
        let mut indices = SecondaryMap::with_capacity(order.len());
        for (index, &id) in order.iter().enumerate() {
            indices.insert(id, index as u32);
        }

        let nodes = order
            .iter()
            .map(|&id| {
                let node = graph.linked(id);
                let children = node.children().iter().map(|&child| indices[child]).collect();
                NodeSnapshot::from_node(node, children)
            })
            .collect();

        Ok(Self { nodes })
    }

    /// Checks that the entries form a single tree rooted at index 0, laid out
    /// in pre-order, and that every rotation is a usable quaternion.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(SceneError::Snapshot("snapshot has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let [x, y, z, w] = node.rotation;
            if normalize_rotation(Quaternion::new(w, x, y, z)).is_none() {
                return Err(SceneError::Snapshot(format!(
                    "node {index} has a zero or non-finite rotation"
                )));
            }
        }

        // Walking the children depth-first must visit 0, 1, 2, ... in order
        let mut stack = vec![0usize];
        let mut next = 0;
        while let Some(index) = stack.pop() {
            if index != next {
                return Err(SceneError::Snapshot(format!(
                    "node {index} is out of pre-order (expected {next}) or has more than one parent"
                )));
            }
            next += 1;

            for &child in self.nodes[index].children.iter().rev() {
                let child = child as usize;
                if child <= index || child >= self.nodes.len() {
                    return Err(SceneError::Snapshot(format!(
                        "node {index} has out-of-order child index {child}"
                    )));
                }
                stack.push(child);
            }
        }

        if next != self.nodes.len() {
            return Err(SceneError::Snapshot(format!(
                "node {next} is not reachable from the root"
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)
            .map_err(|e| SceneError::Snapshot(format!("bincode serialization failed: {e}")))?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Parses and validates snapshot bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SceneError::Snapshot("truncated header".to_string()));
        }
        if bytes[..4] != MAGIC {
            return Err(SceneError::Snapshot("invalid magic number".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        let major = (version >> 8) as u8;
        let minor = (version & 0xFF) as u8;
        if major > 0 || minor > 1 {
            return Err(SceneError::Snapshot(format!(
                "unsupported version {major}.{minor}"
            )));
        }

        let snapshot: Self = bincode::deserialize(&bytes[HEADER_LEN..])
            .map_err(|e| SceneError::Snapshot(format!("bincode deserialization failed: {e}")))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

impl SceneGraph {
    /// Captures the subtree rooted at `id`. See [`GraphSnapshot::capture`].
    pub fn snapshot(&self, id: NodeId) -> Result<GraphSnapshot> {
        GraphSnapshot::capture(self, id)
    }

    /// Creates fresh nodes from `snapshot` and returns the new subtree root.
    ///
    /// The root is attached under `parent`, or becomes a root when `None`.
    /// The new nodes start dirty.
    pub fn instantiate(&mut self, snapshot: &GraphSnapshot, parent: Option<NodeId>) -> Result<NodeId> {
        snapshot.validate()?;
        if let Some(parent) = parent {
            self.node_checked(parent)?;
        }

        let ids: Vec<NodeId> = snapshot
            .nodes
            .iter()
            .map(|node| {
                let local = self.checked_local(node.local_transform());
                self.insert_unlinked(node.to_node(local))
            })
            .collect();

        for (index, node) in snapshot.nodes.iter().enumerate() {
            for &child in &node.children {
                self.link(ids[index], ids[child as usize]);
            }
        }

        let root = ids[0];
        match parent {
            Some(parent) => {
                self.link(parent, root);
                self.emit(|| HierarchyEvent::Attached { parent, child: root });
            }
            None => self.roots.push(root),
        }

        log::debug!("instantiated {} nodes at {root:?}", ids.len());
        Ok(root)
    }

    /// Deep-copies the subtree rooted at `id` next to the original.
    ///
    /// The copy is attached to the same parent, after its existing children.
    pub fn duplicate(&mut self, id: NodeId) -> Result<NodeId> {
        let snapshot = self.snapshot(id)?;
        let parent = self.linked(id).parent();
        self.instantiate(&snapshot, parent)
    }
}
