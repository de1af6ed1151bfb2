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

use super::NodeId;
use umbra_core::math::Mat4;
use umbra_core::renderer::{
    DirectionalLight, Material, MeshId, PointLight, RenderCategory, RenderQueue, Renderable,
    SkyBox,
};

/// What a node contributes to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NodePayload {
    /// A pure transform node; submits nothing.
    #[default]
    Empty,
    /// Opaque geometry.
    Geometry {
        /// The uploaded mesh.
        mesh: MeshId,
        /// Its surface parameters.
        material: Material,
    },
    /// A point light positioned by the node.
    PointLight(PointLight),
    /// A directional light oriented by the node.
    DirectionalLight(DirectionalLight),
    /// An environment cube map.
    SkyBox(SkyBox),
}

impl NodePayload {
    /// The render category of this payload, `None` for [`NodePayload::Empty`].
    pub fn category(&self) -> Option<RenderCategory> {
        match self {
            NodePayload::Empty => None,
            NodePayload::Geometry { .. } => Some(RenderCategory::Geometry),
            NodePayload::PointLight(_) => Some(RenderCategory::PointLight),
            NodePayload::DirectionalLight(_) => Some(RenderCategory::DirectionalLight),
            NodePayload::SkyBox(_) => Some(RenderCategory::SkyBox),
        }
    }
}

/// A node of the transform hierarchy.
///
/// `absolute` is a cache: it equals the parent's absolute transform times
/// `relative` after [`SceneGraph::update_transform`](super::SceneGraph::update_transform)
/// has run over the node's ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialNode {
    /// Diagnostic name.
    pub name: String,
    /// What the node renders.
    pub payload: NodePayload,
    pub(super) relative: Mat4,
    pub(super) absolute: Mat4,
    pub(super) children: Vec<NodeId>,
}

impl SpatialNode {
    /// Creates a detached node with identity transforms.
    pub fn new(name: impl Into<String>, payload: NodePayload) -> Self {
        Self {
            name: name.into(),
            payload,
            relative: Mat4::IDENTITY,
            absolute: Mat4::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Builder-style setter for the relative transform.
    pub fn with_transform(mut self, relative: Mat4) -> Self {
        self.relative = relative;
        self
    }

    /// Transform relative to the parent.
    pub fn relative_transform(&self) -> Mat4 {
        self.relative
    }

    /// Sets the transform relative to the parent. The absolute transform is
    /// refreshed on the next transform update.
    pub fn set_relative_transform(&mut self, relative: Mat4) {
        self.relative = relative;
    }

    /// The cached world transform.
    pub fn absolute_transform(&self) -> Mat4 {
        self.absolute
    }

    /// Child handles, in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Pushes this node's payload, and only this node's, into `queue`.
    pub fn submit(&self, queue: &mut dyn RenderQueue) {
        match self.payload {
            NodePayload::Empty => {}
            NodePayload::Geometry { mesh, material } => queue.submit_renderable(Renderable {
                mesh,
                material,
                world_transform: self.absolute,
            }),
            NodePayload::PointLight(light) => queue.submit_point_light(light, self.absolute),
            NodePayload::DirectionalLight(light) => {
                queue.submit_directional_light(light, self.absolute)
            }
            NodePayload::SkyBox(sky_box) => queue.submit_sky_box(sky_box),
        }
    }
}
