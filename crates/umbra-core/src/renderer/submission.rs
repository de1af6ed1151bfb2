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

//! The submission protocol between a scene and a renderer.
//!
//! A scene does not draw anything itself. When asked to submit, every node
//! pushes a value copy of what it wants rendered (geometry, lights, a sky
//! box) into a [`RenderQueue`]. The renderer owns the queue and drains each
//! category exactly once per frame, so nothing submitted outlives the frame.

use crate::math::{LinearRgba, Mat4};
use crate::renderer::api::{MeshId, TextureId};
use crate::renderer::light::{DirectionalLight, PointLight};
use serde::{Deserialize, Serialize};

/// The closed set of things a scene node can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderCategory {
    /// Opaque geometry for the geometry pass.
    Geometry,
    /// A point light for the light accumulation pass.
    PointLight,
    /// A directional light for the light accumulation pass.
    DirectionalLight,
    /// An environment cube map.
    SkyBox,
}

/// Surface parameters written to the geometry buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Base color.
    pub albedo: LinearRgba,
    /// Microfacet roughness in `[0, 1]`.
    pub roughness: f32,
    /// Metalness in `[0, 1]`.
    pub metalness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: LinearRgba::WHITE,
            roughness: 0.5,
            metalness: 0.0,
        }
    }
}

/// A drawable mesh instance for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderable {
    /// The uploaded geometry.
    pub mesh: MeshId,
    /// The surface parameters.
    pub material: Material,
    /// The node's absolute transform at submission time.
    pub world_transform: Mat4,
}

/// A cube-map environment used for diffuse ambient light, the visible
/// background and reflections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyBox {
    /// A [`TextureDimension::Cube`](crate::renderer::TextureDimension) texture.
    pub cube_map: TextureId,
    /// Multiplier applied to every environment lookup.
    pub intensity: f32,
}

/// Receives per-frame submissions from a scene.
pub trait RenderQueue {
    /// Queues geometry for the geometry pass.
    fn submit_renderable(&mut self, renderable: Renderable);

    /// Queues a point light placed by `world_transform`.
    fn submit_point_light(&mut self, light: PointLight, world_transform: Mat4);

    /// Queues a directional light oriented by `world_transform`.
    fn submit_directional_light(&mut self, light: DirectionalLight, world_transform: Mat4);

    /// Uses `sky_box` as the environment for the current frame.
    fn submit_sky_box(&mut self, sky_box: SkyBox);
}

/// Something that can push its content into a [`RenderQueue`].
///
/// Transforms are expected to be up to date when `submit` is called.
pub trait Submit {
    /// Pushes every renderable item into `queue`.
    fn submit(&self, queue: &mut dyn RenderQueue);
}
