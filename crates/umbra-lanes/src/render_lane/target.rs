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

//! Off-screen render targets.
//!
//! A [`RenderTarget`] is a framebuffer, the surfaces attached to it and the
//! full-screen quad used to draw screen-space passes. Its attachments are
//! the inputs of later passes: [`RenderTarget::bind_textures`] exposes each
//! of them to the active program under its attachment name.

use super::context::RenderContext;
use super::surface::OutputSurface;
use umbra_core::math::{Extent2D, Vec4};
use umbra_core::renderer::{
    ClearFlags, FilterMode, FormatDescriptor, FramebufferDescriptor, FramebufferId, MeshId,
    RenderError, TextureDescriptor, Viewport, WrappingMode,
};

/// Whether a render target carries a depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseDepthBuffer {
    /// Draws are depth tested against the target's own depth buffer.
    Yes,
    /// The target has color attachments only.
    No,
}

/// How to create one color attachment of a [`RenderTarget`].
///
/// The attachment slot is the position in the list handed to
/// [`RenderTarget::new`]; the name is the sampler name later passes read it
/// by.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTexture {
    /// Sampler name of the attachment.
    pub name: String,
    /// Storage format.
    pub format: FormatDescriptor,
    /// Filter used when a later pass samples it.
    pub filter: FilterMode,
    /// Wrapping used when a later pass samples it.
    pub wrap: WrappingMode,
}

impl RenderTexture {
    /// An attachment clamped to its edges.
    pub fn new(name: impl Into<String>, format: FormatDescriptor, filter: FilterMode) -> Self {
        Self {
            name: name.into(),
            format,
            filter,
            wrap: WrappingMode::ClampToEdge,
        }
    }
}

/// A framebuffer with its attachments and full-screen quad.
#[derive(Debug)]
pub struct RenderTarget {
    label: String,
    framebuffer: FramebufferId,
    size: Extent2D,
    attachments: Vec<OutputSurface>,
    depth: UseDepthBuffer,
    quad: MeshId,
}

impl RenderTarget {
    /// Creates the attachments, the framebuffer and the quad.
    ///
    /// # Arguments
    ///
    /// * `label`: Diagnostic name of the target.
    /// * `width`, `height`: Size of every attachment in pixels.
    /// * `textures`: The color attachments, in slot order.
    /// * `depth`: Whether draws are depth tested.
    ///
    /// # Errors
    ///
    /// Fails if an attachment cannot be created or the device reports the
    /// framebuffer incomplete. Attachments created before the failure are
    /// released.
    pub fn new(
        ctx: &mut RenderContext,
        label: &str,
        width: u32,
        height: u32,
        textures: Vec<RenderTexture>,
        depth: UseDepthBuffer,
    ) -> Result<Self, RenderError> {
        let mut attachments: Vec<OutputSurface> = Vec::with_capacity(textures.len());
        for texture in textures {
            let descriptor = TextureDescriptor::new_2d(
                texture.name,
                width,
                height,
                texture.format,
                texture.filter,
                texture.wrap,
            );
            match OutputSurface::new(ctx, descriptor) {
                Ok(surface) => attachments.push(surface),
                Err(err) => {
                    release(ctx, attachments);
                    return Err(err);
                }
            }
        }

        let descriptor = FramebufferDescriptor {
            label: label.to_string(),
            size: Extent2D::new(width, height),
            color_attachments: attachments.iter().map(OutputSurface::id).collect(),
            depth: depth == UseDepthBuffer::Yes,
        };
        let framebuffer = match ctx.device_mut().create_framebuffer(&descriptor) {
            Ok(id) => id,
            Err(err) => {
                log::error!("RenderTarget: '{label}' is incomplete: {err}");
                release(ctx, attachments);
                return Err(err.into());
            }
        };
        let Some(quad) = ctx.upload_mesh(umbra_data::mesh::quad()) else {
            let _ = ctx.device_mut().destroy_framebuffer(framebuffer);
            release(ctx, attachments);
            return Err(RenderError::InitializationFailed(format!(
                "full-screen quad of '{label}'"
            )));
        };

        log::debug!(
            "RenderTarget: '{label}' {width}x{height} with [{}]{}",
            attachments
                .iter()
                .map(OutputSurface::name)
                .collect::<Vec<_>>()
                .join(", "),
            if depth == UseDepthBuffer::Yes { " + depth" } else { "" }
        );
        Ok(Self {
            label: label.to_string(),
            framebuffer,
            size: descriptor.size,
            attachments,
            depth,
            quad,
        })
    }

    /// Directs subsequent draws to this target over its whole area.
    pub fn bind(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.bind_target(
            self.framebuffer,
            &self.label,
            Viewport::from_size(self.size.width, self.size.height),
        )
    }

    /// Returns draws to the default surface.
    pub fn unbind(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.unbind_target(self.framebuffer)
    }

    /// Clears every attachment, and the depth buffer if there is one.
    pub fn clear(&self, ctx: &mut RenderContext, color: Vec4) {
        let flags = match self.depth {
            UseDepthBuffer::Yes => ClearFlags::ALL,
            UseDepthBuffer::No => ClearFlags::COLOR,
        };
        ctx.clear(flags, color);
    }

    /// Binds every attachment to its own texture unit and names it in the
    /// active program. Must be paired with
    /// [`free_texture_units`](Self::free_texture_units) before the units are
    /// reused.
    pub fn bind_textures(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        let mut units = Vec::with_capacity(self.attachments.len());
        for surface in &self.attachments {
            match ctx.bind_texture(surface.name(), surface.id()) {
                Ok(unit) => units.push(unit),
                Err(err) => {
                    for unit in units {
                        let _ = ctx.free_texture_unit(unit);
                    }
                    return Err(err);
                }
            }
        }
        if let Err(err) = ctx.hold_target_units(self.framebuffer, units.clone()) {
            for unit in units {
                let _ = ctx.free_texture_unit(unit);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Releases the units taken by [`bind_textures`](Self::bind_textures).
    pub fn free_texture_units(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        let units = ctx.release_target_units(self.framebuffer).ok_or_else(|| {
            let message = format!("textures of '{}' freed but never bound", self.label);
            log::error!("RenderTarget: {message}");
            RenderError::InvalidState(message)
        })?;
        for unit in units {
            ctx.free_texture_unit(unit)?;
        }
        Ok(())
    }

    /// Regenerates the mip chain of every mip-mapped attachment.
    pub fn generate_mipmaps(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        for surface in &self.attachments {
            surface.generate_mipmaps(ctx)?;
        }
        Ok(())
    }

    /// Draws the full-screen quad with the active program into whatever
    /// target is bound.
    pub fn render(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.draw_mesh(self.quad)
    }

    /// The attachment named `name`.
    pub fn attachment(&self, name: &str) -> Option<&OutputSurface> {
        self.attachments.iter().find(|surface| surface.name() == name)
    }

    /// Every attachment, in slot order.
    pub fn attachments(&self) -> &[OutputSurface] {
        &self.attachments
    }

    /// The full-screen quad mesh.
    pub fn quad(&self) -> MeshId {
        self.quad
    }

    /// Diagnostic name of the target.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Releases the framebuffer, its attachments and the quad.
    pub fn destroy(self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.device_mut().destroy_framebuffer(self.framebuffer)?;
        ctx.device_mut().destroy_mesh(self.quad)?;
        for surface in self.attachments {
            surface.destroy(ctx)?;
        }
        Ok(())
    }
}

fn release(ctx: &mut RenderContext, attachments: Vec<OutputSurface>) {
    for surface in attachments {
        if let Err(err) = surface.destroy(ctx) {
            log::warn!("RenderTarget: leaking attachment: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_lane::test_support::{context, shader_root};
    use crate::render_lane::ShaderProgram;
    use umbra_core::renderer::{ResourceError, TextureFormat};

    fn gbuffer(ctx: &mut RenderContext) -> RenderTarget {
        RenderTarget::new(
            ctx,
            "geometry",
            8,
            4,
            vec![
                RenderTexture::new("albedo_buffer", FormatDescriptor::RGBA8, FilterMode::Nearest),
                RenderTexture::new(
                    "position_buffer",
                    FormatDescriptor::RGB16F,
                    FilterMode::Nearest,
                ),
            ],
            UseDepthBuffer::Yes,
        )
        .unwrap()
    }

    #[test]
    fn test_attachments_are_found_by_name() {
        let mut ctx = context(8, 8);
        let target = gbuffer(&mut ctx);

        assert_eq!((target.width(), target.height()), (8, 4));
        let position = target.attachment("position_buffer").unwrap();
        assert_eq!(position.descriptor().format.storage, TextureFormat::Rgb16Float);
        assert!(target.attachment("normal_buffer").is_none());
    }

    #[test]
    fn test_bind_sets_the_target_viewport() {
        let mut ctx = context(16, 16);
        let target = gbuffer(&mut ctx);

        target.bind(&mut ctx).unwrap();

        assert_eq!(ctx.viewport(), Viewport::from_size(8, 4));
        assert!(matches!(
            target.bind(&mut ctx),
            Err(RenderError::InvalidState(_))
        ));
        target.unbind(&mut ctx).unwrap();
        assert!(ctx.bound_target().is_none());
        assert!(matches!(
            target.unbind(&mut ctx),
            Err(RenderError::InvalidState(_))
        ));
    }

    #[test]
    fn test_bind_textures_is_balanced_by_free() {
        // --- 1. ARRANGE ---
        let mut ctx = context(8, 8);
        let target = gbuffer(&mut ctx);
        let root = shader_root();
        let program = ShaderProgram::from_files(
            &mut ctx,
            "reader",
            root.join("shading_pass.vert"),
            root.join("shading_pass_directional_light.frag"),
        )
        .unwrap();
        let before = ctx.texture_units().clone();

        // --- 2. ACT ---
        let mut scope = ctx.use_program(&program).unwrap();
        target.bind_textures(&mut scope).unwrap();
        let held = scope.texture_units().in_use();
        let twice = target.bind_textures(&mut scope);
        target.free_texture_units(&mut scope).unwrap();
        let freed_twice = target.free_texture_units(&mut scope);
        drop(scope);

        // --- 3. ASSERT ---
        assert_eq!(held, 2);
        assert!(matches!(twice, Err(RenderError::InvalidState(_))));
        assert!(matches!(freed_twice, Err(RenderError::InvalidState(_))));
        assert_eq!(ctx.texture_units(), &before);
    }

    #[test]
    fn test_empty_target_is_rejected() {
        let mut ctx = context(8, 8);
        let result = RenderTarget::new(
            &mut ctx,
            "broken",
            0,
            4,
            vec![RenderTexture::new(
                "albedo_buffer",
                FormatDescriptor::RGBA8,
                FilterMode::Nearest,
            )],
            UseDepthBuffer::No,
        );
        assert!(matches!(
            result,
            Err(RenderError::ResourceError(ResourceError::InvalidFormat(_)))
        ));
    }
}
