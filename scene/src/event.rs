//! Structural change notifications.
//!
//! When [`crate::GraphConfig::record_events`] is set, the graph queues one
//! event per attach, detach or destroy, in the order the changes happened.
//! Transform edits are not reported; they only mark nodes dirty.

use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyEvent {
    /// `child` was appended to `parent`'s children.
    Attached { parent: NodeId, child: NodeId },
    /// `children` were detached from `parent` in this order and are now roots.
    Detached { parent: NodeId, children: Vec<NodeId> },
    /// A subtree was destroyed. `nodes` is in pre-order, so the subtree root
    /// comes first; `parent` is where it was attached, if anywhere.
    Destroyed {
        parent: Option<NodeId>,
        nodes: Vec<NodeId>,
    },
}
