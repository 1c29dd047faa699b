//! Structural edits of the node tree.
//!
//! Every public operation here validates its arguments before touching the
//! tree, so a returned error always means the graph is unchanged. Attaching
//! or detaching a node keeps its local transform as-is; its world transform
//! follows the new parent.

use crate::error::{Result, SceneError};
use crate::event::HierarchyEvent;
use crate::graph::SceneGraph;
use crate::node::{DirtyFlags, NodeId};
use crate::tree;

impl SceneGraph {
    // ========== Tree Mutation ==========

    /// Attaches `child` as the last child of `parent`.
    ///
    /// If `child` currently has another parent it is detached from it first.
    ///
    /// # Errors
    /// * [`SceneError::NullArgument`] if either node is not live.
    /// * [`SceneError::InvalidHierarchy`] if `child` is already a child of
    ///   `parent`, or if `child` is `parent` or one of its ancestors.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node_checked(parent)?;
        let child_node = self.node_checked(child)?;

        if child_node.parent() == Some(parent) {
            return Err(SceneError::InvalidHierarchy(format!(
                "{child:?} is already a child of {parent:?}"
            )));
        }
        if parent == child || self.is_descendant_of(parent, child) {
            return Err(SceneError::InvalidHierarchy(format!(
                "attaching {child:?} under {parent:?} would create a cycle"
            )));
        }

        let previous = self.linked(child).parent();
        self.unlink(child);
        self.link(parent, child);

        if let Some(previous) = previous {
            self.emit(|| HierarchyEvent::Detached {
                parent: previous,
                children: vec![child],
            });
        }
        self.emit(|| HierarchyEvent::Attached { parent, child });
        log::debug!("attached {child:?} under {parent:?}");
        Ok(())
    }

    /// Moves `child` under `parent`, or makes it a root when `parent` is `None`.
    ///
    /// Setting the current parent again is a no-op.
    ///
    /// # Errors
    /// Same as [`SceneGraph::add_child`], apart from the already-a-child case.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<()> {
        match parent {
            None => self.remove_from_parent(child),
            Some(parent) => {
                self.node_checked(parent)?;
                if self.node_checked(child)?.parent() == Some(parent) {
                    return Ok(());
                }
                self.add_child(parent, child)
            }
        }
    }

    /// Detaches `child` from `parent`. The child becomes a root.
    ///
    /// # Errors
    /// * [`SceneError::NullArgument`] if either node is not live.
    /// * [`SceneError::InvalidHierarchy`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node_checked(parent)?;
        if self.node_checked(child)?.parent() != Some(parent) {
            return Err(SceneError::InvalidHierarchy(format!(
                "{child:?} is not a child of {parent:?}"
            )));
        }

        self.unlink(child);
        self.make_root(child);
        self.emit(|| HierarchyEvent::Detached {
            parent,
            children: vec![child],
        });
        log::debug!("detached {child:?} from {parent:?}");
        Ok(())
    }

    /// Detaches every child of `parent`, in order, and returns them.
    ///
    /// The detached subtrees are not destroyed; they become roots and the
    /// caller decides what happens to them next.
    pub fn remove_all_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>> {
        self.node_checked(parent)?;

        let children = self.linked_mut(parent).take_children();
        for &child in &children {
            self.linked_mut(child).set_parent(None);
            self.make_root(child);
        }

        if !children.is_empty() {
            self.emit(|| HierarchyEvent::Detached {
                parent,
                children: children.clone(),
            });
        }
        log::debug!("detached {} children from {parent:?}", children.len());
        Ok(children)
    }

    /// Detaches `id` from its parent. Does nothing for a root.
    pub fn remove_from_parent(&mut self, id: NodeId) -> Result<()> {
        match self.node_checked(id)?.parent() {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(()),
        }
    }

    /// Destroys `id` and its whole subtree, returning how many nodes were removed.
    ///
    /// Handles to every destroyed node become stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<usize> {
        let parent = self.node_checked(id)?.parent();

        let doomed = tree::subtree(self, id);
        self.unlink(id);
        for &node_id in &doomed {
            self.nodes.remove(node_id);
        }

        let count = doomed.len();
        self.emit(|| HierarchyEvent::Destroyed {
            parent,
            nodes: doomed,
        });
        log::debug!("destroyed {count} nodes rooted at {id:?}");
        Ok(count)
    }

    // ========== Internal Linking ==========

    /// Appends a parentless, non-root node to `parent`'s children.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) {
        self.linked_mut(parent).push_child(child);
        self.linked_mut(child).set_parent(Some(parent));
        self.mark_dirty(child, DirtyFlags::PARENT);
    }

    /// Removes `child` from its parent's children or from the root list.
    ///
    /// Leaves the node parentless and outside the root list.
    fn unlink(&mut self, child: NodeId) {
        match self.linked(child).parent() {
            Some(parent) => {
                self.linked_mut(parent).remove_child(child);
                self.linked_mut(child).set_parent(None);
            }
            None => self.roots.retain(|&id| id != child),
        }
    }

    fn make_root(&mut self, id: NodeId) {
        self.roots.push(id);
        self.mark_dirty(id, DirtyFlags::PARENT);
    }

    /// Marks `id` with `flags` and everything below it with [`DirtyFlags::PARENT`].
    ///
    /// Descendants of a dirty node are always dirty, so the walk stops at
    /// nodes that already carry a mark. Nothing is recomputed here.
    pub(crate) fn mark_dirty(&mut self, id: NodeId, flags: DirtyFlags) {
        let node = self.linked_mut(id);
        if !node.mark_dirty(flags) {
            return;
        }

        let mut stack: Vec<NodeId> = node.children().to_vec();
        while let Some(child_id) = stack.pop() {
            let child = self.linked_mut(child_id);
            if child.is_dirty() {
                continue;
            }
            child.mark_dirty(DirtyFlags::PARENT);
            stack.extend_from_slice(child.children());
        }
    }

    // ========== Tree Queries ==========

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node_checked(id)?.parent())
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node_checked(id)?.children())
    }

    pub fn child_count(&self, id: NodeId) -> Result<usize> {
        Ok(self.node_checked(id)?.children().len())
    }

    /// Gets the child at `index` in insertion order.
    pub fn child_at(&self, id: NodeId, index: usize) -> Result<Option<NodeId>> {
        Ok(self.node_checked(id)?.children().get(index).copied())
    }

    /// Finds the first direct child of `id` with the given name.
    pub fn find_child(&self, id: NodeId, name: &str) -> Result<Option<NodeId>> {
        let node = self.node_checked(id)?;
        Ok(node
            .children()
            .iter()
            .copied()
            .find(|&child| self.linked(child).name() == name))
    }

    /// Finds the first node named `name` below `id`, depth-first in child order.
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Result<Option<NodeId>> {
        self.node_checked(id)?;
        Ok(tree::subtree(self, id)
            .into_iter()
            .skip(1)
            .find(|&node| self.linked(node).name() == name))
    }

    /// Returns true if `child` is a direct child of `parent`.
    pub fn is_child_of(&self, child: NodeId, parent: NodeId) -> bool {
        self.nodes
            .get(child)
            .is_some_and(|node| node.parent() == Some(parent))
    }

    /// Returns true if `ancestor` appears on the parent chain of `id`.
    ///
    /// A node is not its own descendant.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|node| node.parent());
        let mut steps = 0;

        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                panic!("scene graph invariant violated: cycle above {id:?}");
            }
            current = self.linked(node_id).parent();
        }

        false
    }

    /// Number of ancestors of `id`. Roots have depth 0.
    pub fn depth(&self, id: NodeId) -> Result<usize> {
        let mut current = self.node_checked(id)?.parent();
        let mut depth = 0;

        while let Some(node_id) = current {
            depth += 1;
            if depth > self.nodes.len() {
                panic!("scene graph invariant violated: cycle above {id:?}");
            }
            current = self.linked(node_id).parent();
        }

        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use crate::{DirtyFlags, GraphConfig, HierarchyEvent, SceneError, SceneGraph};

    fn chain(graph: &mut SceneGraph, len: usize) -> Vec<crate::NodeId> {
        let mut ids = vec![graph.create_node("n0")];
        for i in 1..len {
            let parent = ids[i - 1];
            ids.push(graph.create_child(parent, format!("n{i}")).unwrap());
        }
        ids
    }

    // ========================================================================
    // add_child / set_parent
    // ========================================================================

    #[test]
    fn test_add_child_moves_root_out_of_root_list() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let child = graph.create_node("child");

        graph.add_child(parent, child).unwrap();

        assert_eq!(graph.roots(), &[parent]);
        assert_eq!(graph.children(parent).unwrap(), &[child]);
        assert_eq!(graph.parent(child).unwrap(), Some(parent));
    }

    #[test]
    fn test_add_existing_child_fails() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let child = graph.create_child(parent, "child").unwrap();

        let result = graph.add_child(parent, child);

        assert!(matches!(result, Err(SceneError::InvalidHierarchy(_))));
        assert_eq!(graph.children(parent).unwrap(), &[child]);
    }

    #[test]
    fn test_add_self_as_child_fails() {
        let mut graph = SceneGraph::new();
        let node = graph.create_node("node");

        let result = graph.add_child(node, node);

        assert!(matches!(result, Err(SceneError::InvalidHierarchy(_))));
        assert_eq!(graph.roots(), &[node]);
        assert_eq!(graph.parent(node).unwrap(), None);
    }

    #[test]
    fn test_add_ancestor_as_child_fails_and_leaves_tree_unchanged() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 4);

        let result = graph.add_child(ids[3], ids[1]);

        assert!(matches!(result, Err(SceneError::InvalidHierarchy(_))));
        assert_eq!(graph.roots(), &[ids[0]]);
        for i in 1..4 {
            assert_eq!(graph.parent(ids[i]).unwrap(), Some(ids[i - 1]));
        }
        assert!(graph.children(ids[3]).unwrap().is_empty());
    }

    #[test]
    fn test_add_child_reparents_from_old_parent() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        let child = graph.create_child(a, "child").unwrap();

        graph.add_child(b, child).unwrap();

        assert!(graph.children(a).unwrap().is_empty());
        assert_eq!(graph.children(b).unwrap(), &[child]);
        assert_eq!(graph.parent(child).unwrap(), Some(b));
        assert_eq!(graph.roots(), &[a, b]);
    }

    #[test]
    fn test_add_child_with_stale_handle_fails() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let gone = graph.create_node("gone");
        graph.destroy(gone).unwrap();

        assert_eq!(graph.add_child(parent, gone), Err(SceneError::NullArgument(gone)));
        assert_eq!(graph.add_child(gone, parent), Err(SceneError::NullArgument(gone)));
    }

    #[test]
    fn test_set_parent_to_current_parent_is_noop() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let first = graph.create_child(parent, "first").unwrap();
        let second = graph.create_child(parent, "second").unwrap();

        graph.set_parent(first, Some(parent)).unwrap();

        // Order is untouched, so `first` did not move to the back
        assert_eq!(graph.children(parent).unwrap(), &[first, second]);
    }

    #[test]
    fn test_set_parent_none_detaches() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let child = graph.create_child(parent, "child").unwrap();

        graph.set_parent(child, None).unwrap();

        assert_eq!(graph.parent(child).unwrap(), None);
        assert_eq!(graph.roots(), &[parent, child]);
    }

    #[test]
    fn test_set_parent_into_own_subtree_fails() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 3);

        let result = graph.set_parent(ids[0], Some(ids[2]));

        assert!(matches!(result, Err(SceneError::InvalidHierarchy(_))));
        assert_eq!(graph.roots(), &[ids[0]]);
    }

    // ========================================================================
    // Removal
    // ========================================================================

    #[test]
    fn test_remove_child_preserves_sibling_order() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let c0 = graph.create_child(parent, "c0").unwrap();
        let c1 = graph.create_child(parent, "c1").unwrap();
        let c2 = graph.create_child(parent, "c2").unwrap();

        graph.remove_child(parent, c1).unwrap();

        assert_eq!(graph.children(parent).unwrap(), &[c0, c2]);
        assert_eq!(graph.parent(c1).unwrap(), None);
        assert_eq!(graph.roots(), &[parent, c1]);
    }

    #[test]
    fn test_remove_non_child_fails() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let other = graph.create_node("other");

        let result = graph.remove_child(parent, other);

        assert!(matches!(result, Err(SceneError::InvalidHierarchy(_))));
        assert_eq!(graph.roots(), &[parent, other]);
    }

    #[test]
    fn test_remove_all_children_returns_detached_in_order() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let c0 = graph.create_child(parent, "c0").unwrap();
        let c1 = graph.create_child(parent, "c1").unwrap();
        let grandchild = graph.create_child(c1, "gc").unwrap();

        let detached = graph.remove_all_children(parent).unwrap();

        assert_eq!(detached, vec![c0, c1]);
        assert!(graph.children(parent).unwrap().is_empty());
        assert_eq!(graph.roots(), &[parent, c0, c1]);
        // Detached subtrees survive intact
        assert_eq!(graph.parent(grandchild).unwrap(), Some(c1));
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_remove_from_parent_on_root_is_noop() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");

        graph.remove_from_parent(root).unwrap();

        assert_eq!(graph.roots(), &[root]);
    }

    #[test]
    fn test_destroy_cascades_to_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let keep = graph.create_child(root, "keep").unwrap();
        let doomed = graph.create_child(root, "doomed").unwrap();
        let doomed_child = graph.create_child(doomed, "doomed_child").unwrap();

        let removed = graph.destroy(doomed).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.children(root).unwrap(), &[keep]);
        assert!(!graph.contains(doomed));
        assert!(!graph.contains(doomed_child));
    }

    #[test]
    fn test_destroy_root_removes_from_root_list() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");

        graph.destroy(a).unwrap();

        assert_eq!(graph.roots(), &[b]);
        assert_eq!(graph.destroy(a), Err(SceneError::NullArgument(a)));
    }

    // ========================================================================
    // Dirty Propagation
    // ========================================================================

    #[test]
    fn test_reparent_marks_moved_subtree_dirty() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        let child = graph.create_child(a, "child").unwrap();
        let grandchild = graph.create_child(child, "grandchild").unwrap();
        graph.update_world_transforms();

        graph.add_child(b, child).unwrap();

        assert!(!graph.is_dirty(a).unwrap());
        assert!(!graph.is_dirty(b).unwrap());
        assert_eq!(graph.node(child).unwrap().dirty_flags(), DirtyFlags::PARENT);
        assert_eq!(graph.node(grandchild).unwrap().dirty_flags(), DirtyFlags::PARENT);
    }

    #[test]
    fn test_mark_dirty_reaches_every_descendant() {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let left = graph.create_child(root, "left").unwrap();
        let right = graph.create_child(root, "right").unwrap();
        let leaf = graph.create_child(right, "leaf").unwrap();
        graph.update_world_transforms();

        graph.mark_dirty(root, DirtyFlags::POSITION);

        assert_eq!(graph.node(root).unwrap().dirty_flags(), DirtyFlags::POSITION);
        for id in [left, right, leaf] {
            assert_eq!(graph.node(id).unwrap().dirty_flags(), DirtyFlags::PARENT);
        }
    }

    #[test]
    fn test_mark_dirty_stops_at_dirty_node() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 3);
        graph.update_world_transforms();

        graph.mark_dirty(ids[1], DirtyFlags::ROTATION);
        graph.mark_dirty(ids[1], DirtyFlags::SCALE);

        // The second mark adds its flag to the node but leaves descendants alone
        assert_eq!(
            graph.node(ids[1]).unwrap().dirty_flags(),
            DirtyFlags::ROTATION | DirtyFlags::SCALE
        );
        assert_eq!(graph.node(ids[2]).unwrap().dirty_flags(), DirtyFlags::PARENT);
        assert!(!graph.is_dirty(ids[0]).unwrap());
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[test]
    fn test_child_at_and_count() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let c0 = graph.create_child(parent, "c0").unwrap();
        let c1 = graph.create_child(parent, "c1").unwrap();

        assert_eq!(graph.child_count(parent).unwrap(), 2);
        assert_eq!(graph.child_at(parent, 0).unwrap(), Some(c0));
        assert_eq!(graph.child_at(parent, 1).unwrap(), Some(c1));
        assert_eq!(graph.child_at(parent, 2).unwrap(), None);
    }

    #[test]
    fn test_find_child_returns_first_match() {
        let mut graph = SceneGraph::new();
        let parent = graph.create_node("parent");
        let first = graph.create_child(parent, "twin").unwrap();
        graph.create_child(parent, "twin").unwrap();
        let nested = graph.create_child(first, "nested").unwrap();

        assert_eq!(graph.find_child(parent, "twin").unwrap(), Some(first));
        // Only direct children are searched
        assert_eq!(graph.find_child(parent, "nested").unwrap(), None);
        assert_eq!(graph.find_descendant(parent, "nested").unwrap(), Some(nested));
        assert_eq!(graph.find_descendant(parent, "parent").unwrap(), None);
    }

    #[test]
    fn test_is_child_and_descendant() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 3);

        assert!(graph.is_child_of(ids[1], ids[0]));
        assert!(!graph.is_child_of(ids[2], ids[0]));
        assert!(graph.is_descendant_of(ids[2], ids[0]));
        assert!(!graph.is_descendant_of(ids[0], ids[2]));
        assert!(!graph.is_descendant_of(ids[0], ids[0]));
    }

    #[test]
    fn test_depth() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 4);

        assert_eq!(graph.depth(ids[0]).unwrap(), 0);
        assert_eq!(graph.depth(ids[3]).unwrap(), 3);
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn recording_graph() -> SceneGraph {
        SceneGraph::with_config(GraphConfig::default().with_event_recording(true))
    }

    #[test]
    fn test_reparent_reports_detach_then_attach() {
        let mut graph = recording_graph();
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        let child = graph.create_child(a, "child").unwrap();
        graph.drain_events();

        graph.set_parent(child, Some(b)).unwrap();

        assert_eq!(
            graph.drain_events(),
            vec![
                HierarchyEvent::Detached { parent: a, children: vec![child] },
                HierarchyEvent::Attached { parent: b, child },
            ]
        );
        assert!(graph.pending_events().is_empty());
    }

    #[test]
    fn test_create_child_reports_attach() {
        let mut graph = recording_graph();
        let root = graph.create_node("root");
        assert!(graph.pending_events().is_empty());

        let child = graph.create_child(root, "child").unwrap();
        assert_eq!(
            graph.pending_events(),
            &[HierarchyEvent::Attached { parent: root, child }]
        );
    }

    #[test]
    fn test_remove_all_children_reports_one_batch() {
        let mut graph = recording_graph();
        let root = graph.create_node("root");
        let a = graph.create_child(root, "a").unwrap();
        let b = graph.create_child(root, "b").unwrap();
        graph.drain_events();

        graph.remove_all_children(root).unwrap();
        graph.remove_all_children(root).unwrap();

        assert_eq!(
            graph.drain_events(),
            vec![HierarchyEvent::Detached { parent: root, children: vec![a, b] }]
        );
    }

    #[test]
    fn test_destroy_reports_whole_subtree() {
        let mut graph = recording_graph();
        let ids = chain(&mut graph, 4);
        graph.drain_events();

        graph.destroy(ids[1]).unwrap();

        assert_eq!(
            graph.drain_events(),
            vec![HierarchyEvent::Destroyed {
                parent: Some(ids[0]),
                nodes: vec![ids[1], ids[2], ids[3]],
            }]
        );
    }

    #[test]
    fn test_rejected_edit_reports_nothing() {
        let mut graph = recording_graph();
        let ids = chain(&mut graph, 3);
        graph.drain_events();

        assert!(graph.add_child(ids[2], ids[0]).is_err());
        assert!(graph.remove_child(ids[0], ids[2]).is_err());
        assert!(graph.pending_events().is_empty());
    }

    #[test]
    fn test_events_off_by_default() {
        let mut graph = SceneGraph::new();
        let ids = chain(&mut graph, 3);
        graph.remove_from_parent(ids[1]).unwrap();
        graph.destroy(ids[1]).unwrap();

        assert!(graph.drain_events().is_empty());
    }
}
