//! Hierarchical transform graph.
//!
//! A [`SceneGraph`] owns a forest of [`Node`]s, each holding a local
//! position, rotation and scale relative to its parent. World-space
//! ("derived") transforms are composed down the hierarchy lazily: edits only
//! mark the affected subtree dirty, and values are recomputed when read or
//! when [`SceneGraph::update_world_transforms`] runs.

pub use scenegraph_common as common;

pub mod config;
pub mod error;
pub mod event;
mod graph;
mod hierarchy;
mod manipulate;
pub mod node;
mod resolve;
pub mod snapshot;
pub mod transform;
pub mod tree;

pub use config::GraphConfig;
pub use error::{Result, SceneError};
pub use event::HierarchyEvent;
pub use graph::SceneGraph;
pub use node::{DirtyFlags, Node, NodeId};
pub use snapshot::{GraphSnapshot, NodeSnapshot};
pub use transform::{DerivedTransform, LocalTransform, Space};
pub use tree::{walk_all, walk_tree, TreeVisitor};
