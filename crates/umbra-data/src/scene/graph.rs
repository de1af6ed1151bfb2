// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{NodePayload, SceneError, SpatialNode};
use slotmap::{new_key_type, SecondaryMap, SlotMap};
use umbra_core::math::Mat4;
use umbra_core::renderer::{RenderQueue, Submit};

new_key_type! {
    /// A handle to a node in a [`SceneGraph`].
    pub struct NodeId;
}

/// An arena of [`SpatialNode`]s.
///
/// The graph is a DAG: a node may be the child of several parents, which
/// makes it appear (and render) once per path from the root.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SpatialNode>,
}

impl SceneGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a detached node.
    pub fn insert(&mut self, node: SpatialNode) -> NodeId {
        self.nodes.insert(node)
    }

    /// Adds a detached node built from its parts.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        payload: NodePayload,
        relative: Mat4,
    ) -> NodeId {
        self.insert(SpatialNode::new(name, payload).with_transform(relative))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no live node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node.
    pub fn get(&self, id: NodeId) -> Option<&SpatialNode> {
        self.nodes.get(id)
    }

    /// Looks up a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SpatialNode> {
        self.nodes.get_mut(id)
    }

    /// Sets a node's relative transform.
    pub fn set_relative_transform(
        &mut self,
        id: NodeId,
        relative: Mat4,
    ) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::UnknownNode(id))?;
        node.set_relative_transform(relative);
        Ok(())
    }

    /// The children of `id`, empty if the node does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |node| node.children())
    }

    /// Appends `child` to the children of `parent`.
    ///
    /// The parent does not take ownership; the child stays in the arena
    /// until [`destroy`](Self::destroy) is called on it.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if !self.nodes.contains_key(child) {
            return Err(SceneError::UnknownNode(child));
        }
        if parent == child {
            return Err(SceneError::SelfParenting(child));
        }
        if self.is_reachable(child, parent) {
            return Err(SceneError::CycleDetected { parent, child });
        }
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Removes `child` from the children of `parent` and, recursively, from
    /// the children of every node below `parent`.
    ///
    /// The whole subtree is searched, not only the direct children.
    /// Returns how many references were removed. The removed node itself
    /// stays alive in the arena.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> usize {
        let Some(node) = self.nodes.get_mut(parent) else {
            return 0;
        };
        let before = node.children.len();
        node.children.retain(|&id| id != child);
        let mut removed = before - node.children.len();

        let remaining = node.children.len();
        for index in 0..remaining {
            let next = self.nodes[parent].children[index];
            removed += self.remove_child(next, child);
        }
        removed
    }

    /// Removes a node from the arena and returns it.
    ///
    /// Destruction does not cascade: children stay alive and must be
    /// destroyed on their own. Other nodes may still list the destroyed
    /// handle; traversals skip it.
    pub fn destroy(&mut self, id: NodeId) -> Option<SpatialNode> {
        self.nodes.remove(id)
    }

    /// Returns `true` if `target` is `from` or one of its descendants.
    pub fn is_reachable(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if let Some(node) = self.nodes.get(id) {
                stack.extend_from_slice(&node.children);
            }
        }
        false
    }

    /// Recomputes the absolute transform of `id` as
    /// `parent_absolute * relative`, then recurses into its children.
    pub fn update_transform(&mut self, id: NodeId, parent_absolute: Mat4) {
        let Some(node) = self.nodes.get_mut(id) else {
            log::trace!("Skipping destroyed scene node {id:?} during transform update");
            return;
        };
        node.absolute = parent_absolute * node.relative;
        let absolute = node.absolute;

        let child_count = node.children.len();
        for index in 0..child_count {
            let child = self.nodes[id].children[index];
            self.update_transform(child, absolute);
        }
    }

    /// Refreshes every absolute transform below `root`, the root's parent
    /// being the identity. Call once per frame before submitting.
    pub fn update_transforms(&mut self, root: NodeId) {
        self.update_transform(root, Mat4::IDENTITY);
    }

    /// Advances the scene by `dt` seconds: `hook` runs once on every live
    /// node below `root`, parents first, then absolute transforms are
    /// refreshed. A node shared by several parents is updated once.
    pub fn update<F>(&mut self, root: NodeId, dt: f32, mut hook: F)
    where
        F: FnMut(NodeId, &mut SpatialNode, f32),
    {
        let mut visited = SecondaryMap::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if visited.insert(id, ()).is_some() {
                continue;
            }
            hook(id, node, dt);
            stack.extend(node.children.iter().rev());
        }
        self.update_transforms(root);
    }

    /// Submits `id` and every node below it into `queue`, parents first.
    pub fn submit(&self, id: NodeId, queue: &mut dyn RenderQueue) {
        let Some(node) = self.nodes.get(id) else {
            log::trace!("Skipping destroyed scene node {id:?} during submission");
            return;
        };
        node.submit(queue);
        for &child in &node.children {
            self.submit(child, queue);
        }
    }

    /// A [`Submit`] view of the subtree rooted at `root`.
    pub fn subtree(&self, root: NodeId) -> Subtree<'_> {
        Subtree { graph: self, root }
    }
}

/// The part of a [`SceneGraph`] reachable from one root, ready to be handed
/// to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct Subtree<'a> {
    graph: &'a SceneGraph,
    root: NodeId,
}

impl Submit for Subtree<'_> {
    fn submit(&self, queue: &mut dyn RenderQueue) {
        self.graph.submit(self.root, queue);
    }
}
