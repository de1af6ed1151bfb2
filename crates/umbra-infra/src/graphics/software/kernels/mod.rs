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

//! CPU shading kernels.
//!
//! A program's vertex and fragment stage files are matched to kernels by
//! file stem: `shading_pass_point_light.frag` runs [`lighting::PointLightFragment`],
//! and so on. The stage files themselves stay the source of truth for a GPU
//! backend; kernels reproduce their behavior with the same uniform and
//! sampler names.

mod geometry;
mod lighting;
mod post;
mod reflection;

pub use self::geometry::{FullScreenVertex, GeometryPassFragment, GeometryPassVertex, SkyBoxFragment};
pub use self::lighting::{
    DirectionalLightFragment, EnvironmentDiffuseFragment, IrradiancePassThrough,
    PointLightFragment,
};
pub use self::post::{FinalPassThroughFragment, HighlightsFragment, PostProcessFragment};
pub use self::reflection::ReflectionFragment;

use super::texture::SoftTexture;
use ahash::AHashMap;
use std::cell::RefCell;
use std::fmt::Debug;
use umbra_core::math::{IVec2, Mat3, Mat4, Vec2, Vec3, Vec4};
use umbra_core::renderer::{TextureDimension, TextureId, UniformValue};

/// Number of interpolated `vec4` slots between the stages.
pub const MAX_VARYINGS: usize = 4;

/// Number of color outputs a fragment kernel can write.
pub const MAX_COLOR_OUTPUTS: usize = 4;

/// Interpolated values handed from the vertex to the fragment stage.
pub type Varyings = [Vec4; MAX_VARYINGS];

/// Per-vertex attributes.
#[derive(Debug, Clone, Copy)]
pub struct VertexInput {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

/// Result of a vertex kernel.
#[derive(Debug, Clone, Copy)]
pub struct VertexOutput {
    /// Clip-space position.
    pub clip: Vec4,
    pub varyings: Varyings,
}

/// Per-fragment inputs.
#[derive(Debug, Clone, Copy)]
pub struct FragmentInput {
    /// Window coordinates of the pixel center, window depth and `1 / w`.
    pub frag_coord: Vec4,
    pub varyings: Varyings,
}

/// Colors written to the bound attachments, by slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentOutput {
    pub colors: [Vec4; MAX_COLOR_OUTPUTS],
}

impl FragmentOutput {
    /// Writes `color` to slot 0 and zero to the others.
    pub fn single(color: Vec4) -> Self {
        let mut colors = [Vec4::ZERO; MAX_COLOR_OUTPUTS];
        colors[0] = color;
        Self { colors }
    }
}

/// A vertex stage.
pub trait VertexKernel: Debug + Send + Sync {
    fn run(&self, input: &VertexInput, uniforms: &UniformBlock) -> VertexOutput;
}

/// A fragment stage. Returning `None` discards the fragment.
pub trait FragmentKernel: Debug + Send + Sync {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput>;
}

pub(crate) fn vertex_kernel(stem: &str) -> Option<&'static dyn VertexKernel> {
    Some(match stem {
        "geometry_pass" => &GeometryPassVertex,
        "shading_pass" | "cube_map" => &FullScreenVertex,
        _ => return None,
    })
}

pub(crate) fn fragment_kernel(stem: &str) -> Option<&'static dyn FragmentKernel> {
    Some(match stem {
        "geometry_pass" => &GeometryPassFragment,
        "cube_map" => &SkyBoxFragment,
        "shading_pass_point_light" => &PointLightFragment,
        "shading_pass_directional_light" => &DirectionalLightFragment,
        "shading_pass_environment_diffuse" => &EnvironmentDiffuseFragment,
        "shading_pass_irradiance" => &IrradiancePassThrough,
        "shading_pass_reflection" => &ReflectionFragment,
        "shading_pass_output_highlights" => &HighlightsFragment,
        "shading_pass_post_process" => &PostProcessFragment,
        "final_pass_through" => &FinalPassThroughFragment,
        _ => return None,
    })
}

/// The uniform values of one program.
///
/// Reads of a missing name, or of a name holding another type, return
/// zero like an unset GL uniform.
#[derive(Debug, Clone, Default)]
pub struct UniformBlock {
    values: AHashMap<String, UniformValue>,
}

impl UniformBlock {
    pub fn set(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn int(&self, name: &str) -> i32 {
        match self.get(name) {
            Some(UniformValue::Int(v)) => v,
            _ => 0,
        }
    }

    pub fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(UniformValue::Float(v)) => v,
            _ => 0.0,
        }
    }

    pub fn ivec2(&self, name: &str) -> IVec2 {
        match self.get(name) {
            Some(UniformValue::IVec2(v)) => v,
            _ => IVec2::ZERO,
        }
    }

    pub fn vec2(&self, name: &str) -> Vec2 {
        match self.get(name) {
            Some(UniformValue::Vec2(v)) => v,
            _ => Vec2::ZERO,
        }
    }

    pub fn vec3(&self, name: &str) -> Vec3 {
        match self.get(name) {
            Some(UniformValue::Vec3(v)) => v,
            _ => Vec3::ZERO,
        }
    }

    pub fn vec4(&self, name: &str) -> Vec4 {
        match self.get(name) {
            Some(UniformValue::Vec4(v)) => v,
            _ => Vec4::ZERO,
        }
    }

    pub fn mat3(&self, name: &str) -> Mat3 {
        match self.get(name) {
            Some(UniformValue::Mat3(v)) => v,
            _ => Mat3::ZERO,
        }
    }

    pub fn mat4(&self, name: &str) -> Mat4 {
        match self.get(name) {
            Some(UniformValue::Mat4(v)) => v,
            _ => Mat4::ZERO,
        }
    }
}

/// What a fragment kernel can see: the program's uniforms and the textures
/// bound to the sampling units.
///
/// Sampler uniforms hold a unit index. Sampling through a unit with no
/// texture, a texture of the wrong dimension, or a texture that is also
/// attached to the framebuffer being drawn returns zero and records a
/// diagnostic.
pub struct FragmentContext<'a> {
    uniforms: &'a UniformBlock,
    textures: &'a AHashMap<TextureId, SoftTexture>,
    units: &'a [Option<TextureId>],
    attachments: &'a [TextureId],
    diagnostics: &'a RefCell<Vec<String>>,
}

impl<'a> FragmentContext<'a> {
    pub(crate) fn new(
        uniforms: &'a UniformBlock,
        textures: &'a AHashMap<TextureId, SoftTexture>,
        units: &'a [Option<TextureId>],
        attachments: &'a [TextureId],
        diagnostics: &'a RefCell<Vec<String>>,
    ) -> Self {
        Self {
            uniforms,
            textures,
            units,
            attachments,
            diagnostics,
        }
    }

    pub fn uniforms(&self) -> &UniformBlock {
        self.uniforms
    }

    /// Filtered read of a 2D texture.
    pub fn sample(&self, sampler: &str, uv: Vec2, lod: f32) -> Vec4 {
        self.resolve(sampler, TextureDimension::D2)
            .map_or(Vec4::ZERO, |texture| texture.sample(uv, lod))
    }

    /// Filtered read of a cube map.
    pub fn sample_cube(&self, sampler: &str, direction: Vec3, lod: f32) -> Vec4 {
        self.resolve(sampler, TextureDimension::Cube)
            .map_or(Vec4::ZERO, |texture| texture.sample_cube(direction, lod))
    }

    /// Unfiltered read of a 2D texture texel.
    pub fn texel_fetch(&self, sampler: &str, coord: IVec2, level: u32) -> Vec4 {
        self.resolve(sampler, TextureDimension::D2)
            .map_or(Vec4::ZERO, |texture| texture.texel_fetch(coord, level))
    }

    /// Highest mip level of the texture behind `sampler`.
    pub fn max_lod(&self, sampler: &str, dimension: TextureDimension) -> f32 {
        self.resolve(sampler, dimension)
            .map_or(0.0, SoftTexture::max_lod)
    }

    fn resolve(&self, sampler: &str, dimension: TextureDimension) -> Option<&'a SoftTexture> {
        let unit = self.uniforms.int(sampler);
        let bound = usize::try_from(unit)
            .ok()
            .and_then(|unit| self.units.get(unit).copied().flatten());
        let Some(id) = bound else {
            self.report(format!(
                "sampler '{sampler}' reads texture unit {unit}, which has no texture"
            ));
            return None;
        };
        match self.textures.get(&id) {
            Some(texture) if texture.descriptor().dimension == dimension => Some(texture),
            Some(texture) => {
                self.report(format!(
                    "sampler '{sampler}' expects a {dimension:?} texture but '{}' is {:?}",
                    texture.descriptor().label,
                    texture.descriptor().dimension
                ));
                None
            }
            None if self.attachments.contains(&id) => {
                self.report(format!(
                    "sampler '{sampler}' reads {id:?}, which is attached to the bound framebuffer"
                ));
                None
            }
            None => {
                self.report(format!("sampler '{sampler}' reads destroyed texture {id:?}"));
                None
            }
        }
    }

    fn report(&self, message: String) {
        let mut diagnostics = self.diagnostics.borrow_mut();
        if !diagnostics.contains(&message) {
            diagnostics.push(message);
        }
    }
}

/// Full-screen passes carry the quad's `[0, 1]` coordinates in slot 0.
pub(crate) fn screen_uv(input: &FragmentInput) -> Vec2 {
    input.varyings[0].truncate().truncate()
}

/// `frag_coord.xy / window_size`, for passes drawn at another resolution
/// than the textures they read.
pub(crate) fn window_uv(input: &FragmentInput, uniforms: &UniformBlock) -> Vec2 {
    let size = uniforms.ivec2("window_size").max(IVec2::ONE).as_vec2();
    input.frag_coord.truncate().truncate() / size
}


#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::renderer::{FilterMode, FormatDescriptor, TextureDescriptor, WrappingMode};

    fn textures() -> AHashMap<TextureId, SoftTexture> {
        let descriptor = TextureDescriptor::new_2d(
            "albedo_buffer",
            1,
            1,
            FormatDescriptor::RGBA8,
            FilterMode::Nearest,
            WrappingMode::ClampToEdge,
        );
        let mut texture = SoftTexture::new(&descriptor).unwrap();
        texture.clear(Vec4::ONE);
        let mut map = AHashMap::new();
        map.insert(TextureId(7), texture);
        map
    }

    #[test]
    fn test_missing_uniforms_read_as_zero() {
        let mut block = UniformBlock::default();
        block.set("focus", UniformValue::Int(3));
        assert_eq!(block.float("focus"), 0.0);
        assert_eq!(block.mat4("M"), Mat4::ZERO);
        assert_eq!(block.int("focus"), 3);
    }

    #[test]
    fn test_sampler_resolves_through_unit() {
        // --- 1. ARRANGE ---
        let textures = textures();
        let units = [None, Some(TextureId(7))];
        let mut uniforms = UniformBlock::default();
        uniforms.set("albedo_buffer", UniformValue::Int(1));
        let diagnostics = RefCell::new(Vec::new());
        let context = FragmentContext::new(&uniforms, &textures, &units, &[], &diagnostics);

        // --- 2. ACT ---
        let color = context.sample("albedo_buffer", Vec2::splat(0.5), 0.0);

        // --- 3. ASSERT ---
        assert_eq!(color, Vec4::ONE);
        assert!(diagnostics.borrow().is_empty());
    }

    #[test]
    fn test_unbound_and_attached_samplers_are_reported_once() {
        let textures = textures();
        let units = [None, Some(TextureId(9))];
        let mut uniforms = UniformBlock::default();
        uniforms.set("position_buffer", UniformValue::Int(1));
        let diagnostics = RefCell::new(Vec::new());
        let attachments = [TextureId(9)];
        let context =
            FragmentContext::new(&uniforms, &textures, &units, &attachments, &diagnostics);

        for _ in 0..3 {
            assert_eq!(context.sample("normal_buffer", Vec2::ZERO, 0.0), Vec4::ZERO);
            assert_eq!(context.sample("position_buffer", Vec2::ZERO, 0.0), Vec4::ZERO);
        }

        let diagnostics = diagnostics.borrow();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[1].contains("attached"));
    }

    #[test]
    fn test_cube_sampler_rejects_2d_texture() {
        let textures = textures();
        let units = [Some(TextureId(7))];
        let uniforms = UniformBlock::default();
        let diagnostics = RefCell::new(Vec::new());
        let context = FragmentContext::new(&uniforms, &textures, &units, &[], &diagnostics);

        assert_eq!(context.sample_cube("cube_map", Vec3::X, 0.0), Vec4::ZERO);
        assert_eq!(diagnostics.borrow().len(), 1);
    }

    #[test]
    fn test_kernel_lookup_by_stem() {
        assert!(vertex_kernel("geometry_pass").is_some());
        assert!(fragment_kernel("shading_pass_reflection").is_some());
        assert!(fragment_kernel("shading_pass").is_none());
        assert!(vertex_kernel("toon").is_none());
    }
}
