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

//! The software implementation of the `GraphicsDevice` trait.

use super::format::decode_texel;
use super::kernels::{FragmentContext, FragmentInput, VertexInput, VertexOutput, MAX_COLOR_OUTPUTS};
use super::program::SoftProgram;
use super::raster::{self, Fragment, RasterState};
use super::texture::SoftTexture;
use ahash::AHashMap;
use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use umbra_core::math::{Extent2D, Vec4};
use umbra_core::renderer::{
    BlendMode, ClearFlags, FilterMode, FormatDescriptor, FramebufferDescriptor, FramebufferId,
    GraphicsAdapterInfo, GraphicsBackendType, GraphicsDevice, MeshData, MeshId, PrimitiveTopology,
    ProgramId, RendererDeviceType, ResourceError, ShaderError, ShaderProgramDescriptor,
    TextureDescriptor, TextureDimension, TextureId, UniformValue, Viewport, WrappingMode,
};

/// Sampling slots, the GL minimum.
const MAX_TEXTURE_UNITS: u32 = 16;

/// Color attachments a framebuffer may have.
const MAX_COLOR_ATTACHMENTS: usize = MAX_COLOR_OUTPUTS;

/// Device errors kept for `take_error`; older entries are dropped.
const MAX_PENDING_ERRORS: usize = 64;

/// Counters since the device was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub draw_calls: u64,
    pub fragments: u64,
}

#[derive(Debug)]
struct SoftFramebuffer {
    descriptor: FramebufferDescriptor,
    depth: Option<Vec<f32>>,
}

#[derive(Debug)]
struct Surface {
    color: SoftTexture,
    depth: Vec<f32>,
}

impl Surface {
    fn new(width: u32, height: u32) -> Result<Self, ResourceError> {
        let descriptor = TextureDescriptor::new_2d(
            "surface",
            width.max(1),
            height.max(1),
            FormatDescriptor::RGBA8,
            FilterMode::Nearest,
            WrappingMode::ClampToEdge,
        );
        let color = SoftTexture::new(&descriptor)?;
        let depth = vec![1.0; color.width() as usize * color.height() as usize];
        Ok(Self { color, depth })
    }
}

/// Where a draw writes to.
struct TargetView<'a> {
    colors: Vec<&'a mut SoftTexture>,
    depth: Option<&'a mut [f32]>,
    width: u32,
}

/// A headless CPU device with OpenGL semantics.
///
/// Resources live in hash maps keyed by handles from a single counter, so
/// a handle is never reused. The default surface is an RGBA8 image with a
/// depth buffer; it can be read back with [`GraphicsDevice::read_surface`].
#[derive(Debug)]
pub struct SoftwareDevice {
    textures: AHashMap<TextureId, SoftTexture>,
    framebuffers: AHashMap<FramebufferId, SoftFramebuffer>,
    programs: AHashMap<ProgramId, SoftProgram>,
    meshes: AHashMap<MeshId, MeshData>,
    surface: Surface,
    next_id: usize,

    bound_framebuffer: Option<FramebufferId>,
    active_program: Option<ProgramId>,
    units: Vec<Option<TextureId>>,
    viewport: Viewport,
    depth_test: bool,
    blend_mode: BlendMode,
    cull_back_faces: bool,

    errors: VecDeque<String>,
    stats: DeviceStats,
}

impl SoftwareDevice {
    /// Creates a device whose default surface is `width` x `height`.
    pub fn new(width: u32, height: u32) -> Result<Self, ResourceError> {
        log::info!("SoftwareDevice: creating {width}x{height} surface");
        Ok(Self {
            textures: AHashMap::new(),
            framebuffers: AHashMap::new(),
            programs: AHashMap::new(),
            meshes: AHashMap::new(),
            surface: Surface::new(width, height)?,
            next_id: 0,
            bound_framebuffer: None,
            active_program: None,
            units: vec![None; MAX_TEXTURE_UNITS as usize],
            viewport: Viewport::from_size(width, height),
            depth_test: false,
            blend_mode: BlendMode::Disabled,
            cull_back_faces: false,
            errors: VecDeque::new(),
            stats: DeviceStats::default(),
        })
    }

    /// Draw and fragment counters.
    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// The last value set for `name` on the program labelled `label`.
    pub fn program_uniform(&self, label: &str, name: &str) -> Option<UniformValue> {
        self.programs
            .values()
            .find(|program| program.label == label)
            .and_then(|program| program.uniforms.get(name))
    }

    /// Whether levels `1..` of a texture are older than its last write.
    pub fn has_stale_mips(&self, id: TextureId) -> Option<bool> {
        self.textures.get(&id).map(SoftTexture::has_stale_mips)
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record_error(&mut self, message: String) {
        log::trace!("SoftwareDevice: {message}");
        if self.errors.len() == MAX_PENDING_ERRORS {
            self.errors.pop_front();
        }
        self.errors.push_back(message);
    }

    fn texture(&self, id: TextureId) -> Result<&SoftTexture, ResourceError> {
        self.textures.get(&id).ok_or(ResourceError::NotFound)
    }

    fn texture_mut(&mut self, id: TextureId) -> Result<&mut SoftTexture, ResourceError> {
        self.textures.get_mut(&id).ok_or(ResourceError::NotFound)
    }
}

/// Runs `program` over every primitive of `mesh` into `target`. Returns the
/// number of fragments written.
fn rasterize(
    mesh: &MeshData,
    program: &SoftProgram,
    state: &RasterState,
    depth_test: bool,
    blend_mode: BlendMode,
    target: &mut TargetView<'_>,
    context: &FragmentContext<'_>,
) -> u64 {
    let vertices: Vec<VertexOutput> = mesh
        .positions
        .iter()
        .zip(&mesh.normals)
        .zip(&mesh.tex_coords)
        .map(|((&position, &normal), &tex_coord)| {
            program.vertex.run(
                &VertexInput {
                    position,
                    normal,
                    tex_coord,
                },
                &program.uniforms,
            )
        })
        .collect();

    let mut written = 0;
    let width = target.width;
    let mut shade = |fragment: Fragment| {
        let index = (fragment.y * width + fragment.x) as usize;
        if depth_test {
            if let Some(depth) = target.depth.as_deref() {
                if fragment.depth >= depth[index] {
                    return;
                }
            }
        }
        let input = FragmentInput {
            frag_coord: fragment.frag_coord,
            varyings: fragment.varyings,
        };
        let Some(output) = program.fragment.run(&input, context) else {
            return;
        };
        if depth_test {
            if let Some(depth) = target.depth.as_deref_mut() {
                depth[index] = fragment.depth;
            }
        }
        for (color, texture) in output.colors.iter().zip(target.colors.iter_mut()) {
            let value = match blend_mode {
                BlendMode::Disabled => *color,
                BlendMode::Additive => texture.load(fragment.x, fragment.y) + *color,
            };
            texture.store(fragment.x, fragment.y, value);
        }
        written += 1;
    };

    let per_primitive = mesh.topology.indices_per_primitive();
    for primitive in mesh.indices.chunks_exact(per_primitive) {
        let index = |i: usize| primitive[i] as usize;
        match mesh.topology {
            PrimitiveTopology::Triangles => raster::draw_triangle(
                state,
                [
                    &vertices[index(0)],
                    &vertices[index(1)],
                    &vertices[index(2)],
                ],
                &mut shade,
            ),
            PrimitiveTopology::Lines => raster::draw_line(
                state,
                [&vertices[index(0)], &vertices[index(1)]],
                &mut shade,
            ),
        }
    }
    written
}

impl GraphicsDevice for SoftwareDevice {
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let texture = SoftTexture::new(descriptor)?;
        let id = TextureId(self.next_id());
        log::debug!(
            "SoftwareDevice: created texture '{}' {:?} with {} level(s) as {id:?}",
            descriptor.label,
            descriptor.size,
            texture.level_count()
        );
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn write_texture(
        &mut self,
        id: TextureId,
        layer: u32,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let texture = self.texture_mut(id)?;
        let descriptor = texture.descriptor();
        let expected = descriptor.layer_size_in_bytes();
        if data.len() != expected {
            return Err(ResourceError::InvalidFormat(format!(
                "'{}' expects {expected} bytes per layer, got {}",
                descriptor.label,
                data.len()
            )));
        }
        let format = descriptor.format;
        let texels: Vec<Vec4> = data
            .chunks_exact(format.bytes_per_pixel())
            .map(|texel| decode_texel(&format, texel))
            .collect();
        texture.write_layer(layer, &texels)
    }

    fn read_texture(
        &self,
        id: TextureId,
        level: u32,
        layer: u32,
    ) -> Result<Vec<Vec4>, ResourceError> {
        self.texture(id)?
            .read(level, layer)
            .map(<[Vec4]>::to_vec)
            .ok_or(ResourceError::OutOfBounds)
    }

    fn destroy_texture(&mut self, id: TextureId) -> Result<(), ResourceError> {
        self.textures.remove(&id).ok_or(ResourceError::NotFound)?;
        for unit in self.units.iter_mut().filter(|unit| **unit == Some(id)) {
            *unit = None;
        }
        Ok(())
    }

    fn generate_mipmaps(&mut self, id: TextureId) -> Result<(), ResourceError> {
        let texture = self.texture_mut(id)?;
        if texture.level_count() > 1 {
            texture.generate_mipmaps();
            log::trace!(
                "SoftwareDevice: regenerated {} mip level(s) of '{}'",
                texture.level_count() - 1,
                texture.descriptor().label
            );
        }
        Ok(())
    }

    fn create_framebuffer(
        &mut self,
        descriptor: &FramebufferDescriptor,
    ) -> Result<FramebufferId, ResourceError> {
        let incomplete = |reason: String| {
            ResourceError::FramebufferIncomplete(format!("'{}': {reason}", descriptor.label))
        };
        let size = descriptor.size;
        if size.is_empty() {
            return Err(incomplete(format!("empty size {size:?}")));
        }
        if descriptor.color_attachments.is_empty() && !descriptor.depth {
            return Err(incomplete("no attachments".to_string()));
        }
        if descriptor.color_attachments.len() > MAX_COLOR_ATTACHMENTS {
            return Err(incomplete(format!(
                "{} color attachments, at most {MAX_COLOR_ATTACHMENTS} are supported",
                descriptor.color_attachments.len()
            )));
        }
        for id in &descriptor.color_attachments {
            let texture = self
                .textures
                .get(id)
                .ok_or_else(|| incomplete(format!("attachment {id:?} does not exist")))?;
            let attached = texture.descriptor();
            if attached.dimension != TextureDimension::D2 || !attached.format.storage.is_color() {
                return Err(incomplete(format!(
                    "attachment '{}' is not a 2D color texture",
                    attached.label
                )));
            }
            if texture.width() != size.width || texture.height() != size.height {
                return Err(incomplete(format!(
                    "attachment '{}' is {}x{}, expected {}x{}",
                    attached.label,
                    texture.width(),
                    texture.height(),
                    size.width,
                    size.height
                )));
            }
        }

        let id = FramebufferId(self.next_id());
        let depth = descriptor.depth.then(|| vec![1.0; size.area()]);
        self.framebuffers.insert(
            id,
            SoftFramebuffer {
                descriptor: descriptor.clone(),
                depth,
            },
        );
        log::debug!(
            "SoftwareDevice: created framebuffer '{}' ({}x{}, {} attachment(s), depth: {}) as {id:?}",
            descriptor.label,
            size.width,
            size.height,
            descriptor.color_attachments.len(),
            descriptor.depth
        );
        Ok(id)
    }

    fn destroy_framebuffer(&mut self, id: FramebufferId) -> Result<(), ResourceError> {
        self.framebuffers
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        if self.bound_framebuffer == Some(id) {
            self.bound_framebuffer = None;
        }
        Ok(())
    }

    fn bind_framebuffer(&mut self, id: Option<FramebufferId>) -> Result<(), ResourceError> {
        if let Some(id) = id {
            if !self.framebuffers.contains_key(&id) {
                return Err(ResourceError::NotFound);
            }
        }
        self.bound_framebuffer = id;
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        match Surface::new(width, height) {
            Ok(surface) => self.surface = surface,
            Err(err) => self.record_error(format!("resize_surface({width}, {height}): {err}")),
        }
    }

    fn surface_size(&self) -> Extent2D {
        Extent2D::new(self.surface.color.width(), self.surface.color.height())
    }

    fn read_surface(&self) -> Vec<Vec4> {
        self.surface
            .color
            .read(0, 0)
            .map(<[Vec4]>::to_vec)
            .unwrap_or_default()
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self, flags: ClearFlags, color: Vec4) {
        match self.bound_framebuffer {
            Some(id) => {
                let Some(framebuffer) = self.framebuffers.get_mut(&id) else {
                    return;
                };
                if flags.color {
                    for attachment in &framebuffer.descriptor.color_attachments {
                        if let Some(texture) = self.textures.get_mut(attachment) {
                            texture.clear(color);
                        }
                    }
                }
                if flags.depth {
                    if let Some(depth) = framebuffer.depth.as_mut() {
                        depth.fill(1.0);
                    }
                }
            }
            None => {
                if flags.color {
                    self.surface.color.clear(color);
                }
                if flags.depth {
                    self.surface.depth.fill(1.0);
                }
            }
        }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    fn set_cull_face(&mut self, enabled: bool) {
        self.cull_back_faces = enabled;
    }

    fn create_program(
        &mut self,
        descriptor: &ShaderProgramDescriptor,
    ) -> Result<ProgramId, ResourceError> {
        let program = SoftProgram::compile(descriptor)?;
        let id = ProgramId(self.next_id());
        log::debug!(
            "SoftwareDevice: linked program '{}' as {id:?} ({:?} / {:?})",
            program.label,
            program.vertex,
            program.fragment
        );
        self.programs.insert(id, program);
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) -> Result<(), ResourceError> {
        self.programs
            .remove(&id)
            .ok_or(ResourceError::Shader(ShaderError::NotFound { id }))?;
        if self.active_program == Some(id) {
            self.active_program = None;
        }
        Ok(())
    }

    fn use_program(&mut self, id: Option<ProgramId>) -> Result<(), ResourceError> {
        if let Some(id) = id {
            if !self.programs.contains_key(&id) {
                return Err(ShaderError::NotFound { id }.into());
            }
        }
        self.active_program = id;
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), ResourceError> {
        let program = self
            .active_program
            .and_then(|id| self.programs.get_mut(&id))
            .ok_or_else(|| {
                ResourceError::BackendError(format!("set_uniform('{name}') without an active program"))
            })?;
        program.uniforms.set(name, value);
        Ok(())
    }

    fn bind_texture_unit(
        &mut self,
        unit: u32,
        texture: Option<TextureId>,
    ) -> Result<(), ResourceError> {
        if let Some(id) = texture {
            self.texture(id)?;
        }
        let slot = self
            .units
            .get_mut(unit as usize)
            .ok_or(ResourceError::OutOfBounds)?;
        *slot = texture;
        Ok(())
    }

    fn max_texture_units(&self) -> u32 {
        MAX_TEXTURE_UNITS
    }

    fn create_mesh(&mut self, data: MeshData) -> Result<MeshId, ResourceError> {
        data.validate()?;
        let id = MeshId(self.next_id());
        log::debug!(
            "SoftwareDevice: uploaded mesh {id:?} ({} vertices, {} {:?})",
            data.positions.len(),
            data.primitive_count(),
            data.topology
        );
        self.meshes.insert(id, data);
        Ok(id)
    }

    fn destroy_mesh(&mut self, id: MeshId) -> Result<(), ResourceError> {
        self.meshes
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn draw_mesh(&mut self, id: MeshId) -> Result<(), ResourceError> {
        let Some(program_id) = self.active_program else {
            self.record_error(format!("draw_mesh({id:?}) without an active program"));
            return Ok(());
        };
        let mesh = self.meshes.get(&id).ok_or(ResourceError::NotFound)?;
        let program = self
            .programs
            .get(&program_id)
            .ok_or(ResourceError::Shader(ShaderError::NotFound { id: program_id }))?;

        let diagnostics = RefCell::new(Vec::new());
        let fragments = match self.bound_framebuffer {
            Some(framebuffer_id) => {
                let framebuffer = self
                    .framebuffers
                    .get_mut(&framebuffer_id)
                    .ok_or(ResourceError::InvalidHandle)?;
                let size = framebuffer.descriptor.size;
                let attachment_ids = framebuffer.descriptor.color_attachments.clone();

                // Attachments leave the texture table for the draw so that a
                // pass cannot sample what it writes.
                let mut attachments: Vec<(TextureId, SoftTexture)> = attachment_ids
                    .iter()
                    .filter_map(|id| self.textures.remove(id).map(|texture| (*id, texture)))
                    .collect();

                let state = RasterState {
                    viewport: self.viewport,
                    cull_back_faces: self.cull_back_faces,
                    target_width: size.width,
                    target_height: size.height,
                };
                let context = FragmentContext::new(
                    &program.uniforms,
                    &self.textures,
                    &self.units,
                    &attachment_ids,
                    &diagnostics,
                );
                let mut target = TargetView {
                    colors: attachments.iter_mut().map(|(_, texture)| texture).collect(),
                    depth: framebuffer.depth.as_deref_mut(),
                    width: size.width,
                };
                let written = rasterize(
                    mesh,
                    program,
                    &state,
                    self.depth_test,
                    self.blend_mode,
                    &mut target,
                    &context,
                );
                self.textures.extend(attachments);
                written
            }
            None => {
                let state = RasterState {
                    viewport: self.viewport,
                    cull_back_faces: self.cull_back_faces,
                    target_width: self.surface.color.width(),
                    target_height: self.surface.color.height(),
                };
                let context = FragmentContext::new(
                    &program.uniforms,
                    &self.textures,
                    &self.units,
                    &[],
                    &diagnostics,
                );
                let mut target = TargetView {
                    width: self.surface.color.width(),
                    colors: vec![&mut self.surface.color],
                    depth: Some(self.surface.depth.as_mut_slice()),
                };
                rasterize(
                    mesh,
                    program,
                    &state,
                    self.depth_test,
                    self.blend_mode,
                    &mut target,
                    &context,
                )
            }
        };

        self.stats.draw_calls += 1;
        self.stats.fragments += fragments;
        let label = program.label.clone();
        for message in diagnostics.into_inner() {
            self.record_error(format!("program '{label}': {message}"));
        }
        Ok(())
    }

    fn take_error(&mut self) -> Option<String> {
        self.errors.pop_front()
    }

    fn get_adapter_info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: "Umbra software rasterizer".to_string(),
            backend_type: GraphicsBackendType::Software,
            device_type: RendererDeviceType::Cpu,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
