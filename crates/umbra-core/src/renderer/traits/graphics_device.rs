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

use crate::math::{Extent2D, Vec4};
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::any::Any;
use std::fmt::Debug;

/// A stateful, immediate-mode graphics device.
///
/// The contract follows the classic bind-then-draw model: a framebuffer, a
/// program, texture units and fixed-function state are bound, then
/// [`draw_mesh`](Self::draw_mesh) rasterizes into the bound target using that
/// state. The device is driven from a single render thread.
pub trait GraphicsDevice: Send + Debug + 'static {
    /// Creates a texture from the provided descriptor. Its content starts
    /// zeroed.
    /// ## Arguments
    /// * `descriptor` - Size, dimension, format and sampling of the texture.
    /// ## Returns
    /// The ID of the created texture.
    /// ## Errors
    /// * `ResourceError::InvalidFormat` - If the extent is empty or a cube
    ///   map has non-square faces.
    fn create_texture(&mut self, descriptor: &TextureDescriptor)
        -> Result<TextureId, ResourceError>;

    /// Uploads one layer of level 0. `data` is encoded with the texture's
    /// component type and must cover the whole layer.
    fn write_texture(
        &mut self,
        id: TextureId,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Reads back one layer of one mip level, rows bottom-up, every texel
    /// expanded to RGBA.
    fn read_texture(
        &self,
        id: TextureId,
        level: u32,
        layer: u32,
    ) -> Result<Vec<Vec4>, ResourceError>;

    /// Destroys a texture.
    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError>;

    /// Regenerates levels `1..` of the mip chain from level 0.
    ///
    /// Textures without a mip chain are left untouched.
    fn generate_mipmaps(&mut self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a framebuffer and checks its completeness.
    /// ## Errors
    /// * `ResourceError::FramebufferIncomplete` - If there is nothing to
    ///   render into, an attachment size differs from the framebuffer size,
    ///   or an attachment is not a 2D color texture.
    fn create_framebuffer(
        &mut self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError>;

    /// Destroys a framebuffer. Its attachments are not destroyed.
    fn destroy_framebuffer(&mut self, id: FramebufferId) -> Result<(), ResourceError>;

    /// Directs subsequent clears and draws to `id`, or to the default
    /// surface when `None`.
    fn bind_framebuffer(&mut self, id: Option<FramebufferId>) -> Result<(), ResourceError>;

    /// Resizes the default surface, typically after a window resize.
    fn resize_surface(&mut self, width: u32, height: u32);

    /// Size of the default surface.
    fn surface_size(&self) -> Extent2D;

    /// Reads back the default surface, rows bottom-up.
    fn read_surface(&self) -> Vec<Vec4>;

    /// Sets the viewport draws are mapped to.
    fn set_viewport(&mut self, viewport: Viewport);

    /// The current viewport.
    fn viewport(&self) -> Viewport;

    /// Clears the bound target.
    fn clear(&mut self, flags: ClearFlags, color: Vec4);

    /// Enables or disables depth testing (and depth writes).
    fn set_depth_test(&mut self, enabled: bool);

    /// Sets color blending.
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Enables or disables culling of back faces.
    fn set_cull_face(&mut self, enabled: bool);

    /// Loads every stage of a program from disk and links it.
    /// ## Errors
    /// * `ShaderError::MissingStage` - If the vertex or fragment path is absent.
    /// * `ShaderError::LoadError` - If a stage file cannot be read.
    /// * `ShaderError::CompilationError` - If a stage cannot be compiled.
    fn create_program(
        &mut self,
        descriptor: &ShaderProgramDescriptor,
    ) -> Result<ProgramId, ResourceError>;

    /// Destroys a program.
    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError>;

    /// Makes `id` the active program, or deactivates programs when `None`.
    fn use_program(&mut self, id: Option<ProgramId>) -> Result<(), ResourceError>;

    /// Sets a named parameter of the active program. Values persist in the
    /// program until overwritten.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), ResourceError>;

    /// Binds `texture` to the sampling slot `unit`, or unbinds it.
    fn bind_texture_unit(
        &mut self,
        unit: u32,
        texture: Option<TextureId>,
    ) -> Result<(), ResourceError>;

    /// Number of sampling slots.
    fn max_texture_units(&self) -> u32;

    /// Takes ownership of `data` and uploads it.
    fn create_mesh(&mut self, data: MeshData) -> Result<MeshId, ResourceError>;

    /// Destroys a mesh.
    fn destroy_mesh(&mut self, id: MeshId) -> Result<(), ResourceError>;

    /// Draws a mesh with the active program into the bound target.
    fn draw_mesh(&mut self, id: MeshId) -> Result<(), ResourceError>;

    /// Pops the oldest recorded device error, if any. Diagnostic only.
    fn take_error(&mut self) -> Option<String>;

    /// Information about the adapter behind this device.
    fn get_adapter_info(&self) -> GraphicsAdapterInfo;

    /// Upcast for backend-specific queries.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for backend-specific queries.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
