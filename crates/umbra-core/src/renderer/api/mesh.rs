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

//! Value-typed geometry.
//!
//! A [`MeshData`] is built by a loader or a primitive generator and then moved
//! into the device; the device owns the buffers from that point on.

use crate::math::{Vec2, Vec3};
use crate::renderer::error::ResourceError;

/// A handle to geometry uploaded to a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// How the index list is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Every three indices form a triangle.
    #[default]
    Triangles,
    /// Every two indices form a line segment.
    Lines,
}

impl PrimitiveTopology {
    /// Indices consumed per primitive.
    pub fn indices_per_primitive(&self) -> usize {
        match self {
            PrimitiveTopology::Triangles => 3,
            PrimitiveTopology::Lines => 2,
        }
    }
}

/// Indexed vertex data: positions, normals and texture coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Vertex positions in object space.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals, same length as `positions`.
    pub normals: Vec<Vec3>,
    /// Per-vertex texture coordinates, same length as `positions`.
    pub tex_coords: Vec<Vec2>,
    /// Element indices.
    pub indices: Vec<u16>,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
}

impl MeshData {
    /// Checks that the mesh can be drawn.
    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.positions.is_empty() || self.indices.is_empty() {
            return Err(ResourceError::InvalidMeshData(
                "mesh has no vertices or no indices".to_string(),
            ));
        }
        if self.normals.len() != self.positions.len()
            || self.tex_coords.len() != self.positions.len()
        {
            return Err(ResourceError::InvalidMeshData(format!(
                "attribute lengths differ: {} positions, {} normals, {} tex coords",
                self.positions.len(),
                self.normals.len(),
                self.tex_coords.len()
            )));
        }
        let per_primitive = self.topology.indices_per_primitive();
        if self.indices.len() % per_primitive != 0 {
            return Err(ResourceError::InvalidMeshData(format!(
                "{} indices do not form whole {:?} primitives",
                self.indices.len(),
                self.topology
            )));
        }
        if let Some(index) = self
            .indices
            .iter()
            .find(|&&index| index as usize >= self.positions.len())
        {
            return Err(ResourceError::InvalidMeshData(format!(
                "index {index} out of range for {} vertices",
                self.positions.len()
            )));
        }
        Ok(())
    }

    /// Number of primitives the index list describes.
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.topology.indices_per_primitive()
    }
}
