use crate::graph::SceneGraph;
use crate::node::{Node, NodeId};

/// Trait for implementing tree traversal operations.
///
/// Implementors of this trait can be passed to [`walk_tree`] or [`walk_all`]
/// to perform arbitrary operations on each node during traversal.
///
/// The visitor receives callbacks when entering and exiting nodes.
pub trait TreeVisitor {
    /// Called when entering a node (before processing its children).
    ///
    /// Returns true to continue traversing children, false to skip the subtree.
    fn enter_node(&mut self, id: NodeId, node: &Node) -> bool;

    /// Called when exiting a node (after processing its children).
    fn exit_node(&mut self, _id: NodeId, _node: &Node) {}
}

enum Step {
    Enter(NodeId),
    Exit(NodeId),
}

/// Walks the subtree rooted at `node_id` depth-first, children in order.
///
/// Does nothing if `node_id` is not a live node. Uses an explicit stack, so
/// deep hierarchies cannot overflow the call stack.
pub fn walk_tree<V: TreeVisitor>(graph: &SceneGraph, node_id: NodeId, visitor: &mut V) {
    if !graph.contains(node_id) {
        return;
    }

    let mut stack = vec![Step::Enter(node_id)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                let node = graph.linked(id);
                stack.push(Step::Exit(id));
                if visitor.enter_node(id, node) {
                    // Reversed so the first child is popped first
                    stack.extend(node.children().iter().rev().map(|&child| Step::Enter(child)));
                }
            }
            Step::Exit(id) => visitor.exit_node(id, graph.linked(id)),
        }
    }
}

/// Walks every tree of the graph, roots in order.
pub fn walk_all<V: TreeVisitor>(graph: &SceneGraph, visitor: &mut V) {
    for &root in graph.roots() {
        walk_tree(graph, root, visitor);
    }
}

/// Collects `node_id` and all of its descendants in pre-order.
pub(crate) fn subtree(graph: &SceneGraph, node_id: NodeId) -> Vec<NodeId> {
    struct Collect(Vec<NodeId>);

    impl TreeVisitor for Collect {
        fn enter_node(&mut self, id: NodeId, _node: &Node) -> bool {
            self.0.push(id);
            true
        }
    }

    let mut collect = Collect(Vec::new());
    walk_tree(graph, node_id, &mut collect);
    collect.0
}
