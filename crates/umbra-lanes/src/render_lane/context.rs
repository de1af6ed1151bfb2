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

//! The render context handed explicitly to every pass.
//!
//! The device itself is a flat state machine. The context layers the
//! scoping rules of the renderer on top of it: at most one program is active
//! and only inside a [`ProgramScope`], at most one render target is bound,
//! and sampling slots come from a [`TextureUnitAllocator`] so that every
//! unit handed out is eventually given back.

use super::program::ShaderProgram;
use ahash::AHashMap;
use std::ops::{Deref, DerefMut};
use umbra_core::math::Vec4;
use umbra_core::renderer::{
    BlendMode, ClearFlags, FramebufferId, GraphicsDevice, MeshData, MeshId, ProgramId,
    RenderError, TextureId, UniformValue, Viewport,
};

/// Hands out sampling slots, lowest free slot first.
///
/// Two allocators compare equal when the same slots are in use, which makes
/// it easy to check that binds and frees are balanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureUnitAllocator {
    in_use: Vec<bool>,
}

impl TextureUnitAllocator {
    /// An allocator over `unit_count` slots, all free.
    pub fn new(unit_count: u32) -> Self {
        Self {
            in_use: vec![false; unit_count as usize],
        }
    }

    /// Reserves the lowest free slot.
    pub fn allocate(&mut self) -> Option<u32> {
        let unit = self.in_use.iter().position(|used| !used)?;
        self.in_use[unit] = true;
        Some(unit as u32)
    }

    /// Gives a slot back. Returns `false` if it was not reserved.
    pub fn free(&mut self, unit: u32) -> bool {
        match self.in_use.get_mut(unit as usize) {
            Some(used) if *used => {
                *used = false;
                true
            }
            _ => false,
        }
    }

    /// Number of reserved slots.
    pub fn in_use(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }

    /// Total number of slots.
    pub fn capacity(&self) -> u32 {
        self.in_use.len() as u32
    }
}

/// The device and the bind state layered on top of it.
#[derive(Debug)]
pub struct RenderContext {
    device: Box<dyn GraphicsDevice>,
    active_program: Option<(ProgramId, String)>,
    bound_target: Option<(FramebufferId, String)>,
    units: TextureUnitAllocator,
    /// Units reserved by `RenderTarget::bind_textures`, per target.
    target_units: AHashMap<FramebufferId, Vec<u32>>,
}

impl RenderContext {
    /// Wraps a device. Every texture unit it offers starts free.
    pub fn new(device: Box<dyn GraphicsDevice>) -> Self {
        let adapter = device.get_adapter_info();
        log::info!(
            "RenderContext: using '{}' ({:?}, {:?}), {} texture units",
            adapter.name,
            adapter.backend_type,
            adapter.device_type,
            device.max_texture_units()
        );
        let units = TextureUnitAllocator::new(device.max_texture_units());
        Self {
            device,
            active_program: None,
            bound_target: None,
            units,
            target_units: AHashMap::new(),
        }
    }

    /// The underlying device.
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// The underlying device, mutably. State changed through it bypasses the
    /// bookkeeping of the context.
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    /// Downcasts the device to its concrete backend type.
    pub fn device_as<T: GraphicsDevice>(&self) -> Option<&T> {
        self.device.as_any().downcast_ref::<T>()
    }

    /// Activates `program` for the lifetime of the returned scope.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidState`] if another program is already
    /// active. Scopes never nest.
    pub fn use_program(
        &mut self,
        program: &ShaderProgram,
    ) -> Result<ProgramScope<'_>, RenderError> {
        if let Some((_, active)) = &self.active_program {
            let message = format!(
                "program '{}' activated while '{active}' is active",
                program.label()
            );
            log::error!("RenderContext: {message}");
            return Err(RenderError::InvalidState(message));
        }
        self.device.use_program(Some(program.id()))?;
        self.active_program = Some((program.id(), program.label().to_string()));
        log::trace!("RenderContext: program '{}' active", program.label());
        Ok(ProgramScope { ctx: self })
    }

    /// Label of the active program, if any.
    pub fn active_program(&self) -> Option<&str> {
        self.active_program.as_ref().map(|(_, label)| label.as_str())
    }

    /// Sets a named parameter of the active program.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        if self.active_program.is_none() {
            let message = format!("uniform '{name}' set with no active program");
            log::error!("RenderContext: {message}");
            return Err(RenderError::InvalidState(message));
        }
        self.device.set_uniform(name, value)?;
        Ok(())
    }

    /// Directs draws to `id` and maps them to `viewport`.
    pub fn bind_target(
        &mut self,
        id: FramebufferId,
        label: &str,
        viewport: Viewport,
    ) -> Result<(), RenderError> {
        if let Some((_, bound)) = &self.bound_target {
            let message = format!("target '{label}' bound while '{bound}' is bound");
            log::error!("RenderContext: {message}");
            return Err(RenderError::InvalidState(message));
        }
        self.device.bind_framebuffer(Some(id))?;
        self.device.set_viewport(viewport);
        self.bound_target = Some((id, label.to_string()));
        Ok(())
    }

    /// Returns draws to the default surface. `id` must be the bound target.
    pub fn unbind_target(&mut self, id: FramebufferId) -> Result<(), RenderError> {
        let message = match &self.bound_target {
            Some((bound, _)) if *bound == id => None,
            Some((_, bound)) => Some(format!("unbinding {id:?} while '{bound}' is bound")),
            None => Some(format!("unbinding {id:?} while no target is bound")),
        };
        if let Some(message) = message {
            log::error!("RenderContext: {message}");
            return Err(RenderError::InvalidState(message));
        }
        self.device.bind_framebuffer(None)?;
        self.bound_target = None;
        Ok(())
    }

    /// The bound render target, `None` for the default surface.
    pub fn bound_target(&self) -> Option<FramebufferId> {
        self.bound_target.as_ref().map(|(id, _)| *id)
    }

    /// Binds `texture` to a fresh unit and points the sampler `name` of the
    /// active program at it. Returns the unit, which must be given back with
    /// [`free_texture_unit`](Self::free_texture_unit).
    pub fn bind_texture(&mut self, name: &str, texture: TextureId) -> Result<u32, RenderError> {
        let unit = self.units.allocate().ok_or_else(|| {
            let message = format!(
                "no free texture unit for '{name}', all {} are in use",
                self.units.capacity()
            );
            log::error!("RenderContext: {message}");
            RenderError::InvalidState(message)
        })?;
        let bound = self
            .device
            .bind_texture_unit(unit, Some(texture))
            .map_err(RenderError::from)
            .and_then(|()| self.set_uniform(name, UniformValue::Int(unit as i32)));
        if let Err(err) = bound {
            self.units.free(unit);
            let _ = self.device.bind_texture_unit(unit, None);
            return Err(err);
        }
        Ok(unit)
    }

    /// Unbinds and frees a unit returned by
    /// [`bind_texture`](Self::bind_texture).
    pub fn free_texture_unit(&mut self, unit: u32) -> Result<(), RenderError> {
        if !self.units.free(unit) {
            let message = format!("texture unit {unit} freed but not in use");
            log::error!("RenderContext: {message}");
            return Err(RenderError::InvalidState(message));
        }
        self.device.bind_texture_unit(unit, None)?;
        Ok(())
    }

    /// Current state of the sampling slots.
    pub fn texture_units(&self) -> &TextureUnitAllocator {
        &self.units
    }

    pub(crate) fn hold_target_units(
        &mut self,
        target: FramebufferId,
        units: Vec<u32>,
    ) -> Result<(), RenderError> {
        if self.target_units.contains_key(&target) {
            let message = format!("textures of {target:?} bound twice without being freed");
            log::error!("RenderContext: {message}");
            return Err(RenderError::InvalidState(message));
        }
        self.target_units.insert(target, units);
        Ok(())
    }

    pub(crate) fn release_target_units(&mut self, target: FramebufferId) -> Option<Vec<u32>> {
        self.target_units.remove(&target)
    }

    /// Uploads a mesh. Invalid data is logged and yields `None`.
    pub fn upload_mesh(&mut self, data: MeshData) -> Option<MeshId> {
        match self.device.create_mesh(data) {
            Ok(id) => Some(id),
            Err(err) => {
                log::error!("RenderContext: mesh upload failed: {err}");
                None
            }
        }
    }

    /// Draws `mesh` with the active program into the bound target.
    pub fn draw_mesh(&mut self, mesh: MeshId) -> Result<(), RenderError> {
        if self.active_program.is_none() {
            let message = format!("{mesh:?} drawn with no active program");
            log::error!("RenderContext: {message}");
            return Err(RenderError::InvalidState(message));
        }
        self.device.draw_mesh(mesh)?;
        Ok(())
    }

    /// Sets the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.device.set_viewport(viewport);
    }

    /// The current viewport.
    pub fn viewport(&self) -> Viewport {
        self.device.viewport()
    }

    /// Clears the bound target.
    pub fn clear(&mut self, flags: ClearFlags, color: Vec4) {
        self.device.clear(flags, color);
    }

    /// Enables or disables depth testing.
    pub fn set_depth_test(&mut self, enabled: bool) {
        self.device.set_depth_test(enabled);
    }

    /// Sets color blending.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.device.set_blend_mode(mode);
    }

    /// Enables or disables back-face culling.
    pub fn set_cull_face(&mut self, enabled: bool) {
        self.device.set_cull_face(enabled);
    }

    /// Regenerates the mip chain of a texture.
    pub fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), RenderError> {
        self.device.generate_mipmaps(texture)?;
        Ok(())
    }

    /// Drains the errors the device recorded and logs them. Diagnostic
    /// only, returns how many there were.
    pub fn check_errors(&mut self) -> usize {
        let mut count = 0;
        while let Some(err) = self.device.take_error() {
            log::error!("RenderContext: device error: {err}");
            count += 1;
        }
        count
    }

    /// Drops the bind state left behind by a frame that failed half way.
    pub(crate) fn abandon_frame(&mut self) {
        if let Some((_, label)) = self.bound_target.take() {
            log::warn!("RenderContext: unbinding '{label}' after a failed frame");
            if let Err(err) = self.device.bind_framebuffer(None) {
                log::error!("RenderContext: {err}");
            }
        }
        self.target_units.clear();
        if self.units.in_use() > 0 {
            for unit in 0..self.units.capacity() {
                let _ = self.device.bind_texture_unit(unit, None);
            }
            self.units = TextureUnitAllocator::new(self.units.capacity());
        }
    }
}

/// An active program. Dereferences to the context so passes keep using it
/// while the program is active; dropping the scope deactivates the program.
#[derive(Debug)]
pub struct ProgramScope<'a> {
    ctx: &'a mut RenderContext,
}

impl Deref for ProgramScope<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        self.ctx
    }
}

impl DerefMut for ProgramScope<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        self.ctx
    }
}

impl Drop for ProgramScope<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.ctx.device.use_program(None) {
            log::error!("RenderContext: failed to deactivate program: {err}");
        }
        self.ctx.active_program = None;
    }
}
