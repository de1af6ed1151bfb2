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

use super::context::RenderContext;
use umbra_core::renderer::{
    CpuTexture, FilterMode, RenderError, ResourceError, TextureDescriptor, TextureDimension,
    TextureId, WrappingMode,
};

/// A texture owned by the renderer: a render attachment, a sky box or any
/// other image a pass samples.
///
/// The mip chain of a [`FilterMode::LinearMipMap`] surface is stale after
/// every write until [`generate_mipmaps`](Self::generate_mipmaps) runs.
#[derive(Debug)]
pub struct OutputSurface {
    id: TextureId,
    descriptor: TextureDescriptor,
}

impl OutputSurface {
    /// Creates an empty surface on the device.
    pub fn new(
        ctx: &mut RenderContext,
        descriptor: TextureDescriptor,
    ) -> Result<Self, RenderError> {
        let id = ctx.device_mut().create_texture(&descriptor)?;
        log::trace!(
            "OutputSurface: '{}' {}x{}x{} {:?}",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth_or_array_layers,
            descriptor.format.storage
        );
        Ok(Self { id, descriptor })
    }

    /// Uploads an image. Six-layer square images become cube maps, single
    /// layers 2D textures.
    pub fn from_cpu(
        ctx: &mut RenderContext,
        label: &str,
        texture: &CpuTexture,
        filter: FilterMode,
        wrap: WrappingMode,
    ) -> Result<Self, RenderError> {
        let size = texture.size;
        let descriptor = match size.depth_or_array_layers {
            1 => TextureDescriptor::new_2d(
                label,
                size.width,
                size.height,
                texture.format,
                filter,
                wrap,
            ),
            6 if size.width == size.height => {
                TextureDescriptor::cube(label, size.width, texture.format, filter)
            }
            layers => {
                return Err(ResourceError::InvalidFormat(format!(
                    "'{label}': {layers} layers of {}x{} is neither a 2D image nor a cube map",
                    size.width, size.height
                ))
                .into())
            }
        };
        let surface = Self::new(ctx, descriptor)?;
        for layer in 0..size.depth_or_array_layers {
            let data = texture.layer(layer).ok_or(ResourceError::OutOfBounds)?;
            ctx.device_mut().write_texture(surface.id, layer, data)?;
        }
        surface.generate_mipmaps(ctx)?;
        Ok(surface)
    }

    /// Device handle of the surface.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// The descriptor the surface was created from.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Sampler name of the surface.
    pub fn name(&self) -> &str {
        &self.descriptor.label
    }

    /// Whether this is a cube map.
    pub fn is_cube(&self) -> bool {
        self.descriptor.dimension == TextureDimension::Cube
    }

    /// Rebuilds the mip chain from level 0. Does nothing for surfaces
    /// without one.
    pub fn generate_mipmaps(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        if self.descriptor.filter == FilterMode::LinearMipMap {
            ctx.generate_mipmaps(self.id)?;
        }
        Ok(())
    }

    /// Releases the surface on the device.
    pub fn destroy(self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.device_mut().destroy_texture(self.id)?;
        Ok(())
    }
}
