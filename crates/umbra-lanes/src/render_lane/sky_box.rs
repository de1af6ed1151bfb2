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

//! Sky box cube maps and the environment lookups that read them.
//!
//! The sky box feeds three sub-steps of a frame: the diffuse environment
//! term and the background of the light pass, and the cube map fallback of
//! the reflection pass. Each of them binds the cube map through
//! [`bind_environment`].

use super::context::RenderContext;
use super::surface::OutputSurface;
use umbra_core::math::{smoothstep, LinearRgba, Mat3, Vec2};
use umbra_core::renderer::{
    cube_face_direction, CpuTexture, FilterMode, FormatDescriptor, PerspectiveCamera,
    RenderError, SkyBox, TextureDescriptor, UniformValue, WrappingMode,
};

/// Sampler name of the sky box in every program that reads it.
pub const CUBE_MAP_SAMPLER: &str = "cube_map";

/// Uploads six faces (+X, -X, +Y, -Y, +Z, -Z) as a mip-mapped cube map.
pub fn create_cube_map(
    ctx: &mut RenderContext,
    label: &str,
    faces: &CpuTexture,
) -> Result<OutputSurface, RenderError> {
    OutputSurface::from_cpu(
        ctx,
        label,
        faces,
        FilterMode::LinearMipMap,
        WrappingMode::ClampToEdge,
    )
}

/// Builds a procedural sky: `zenith` straight up, fading to `horizon`, and
/// a darker ground below the horizon.
pub fn gradient_sky_box(
    ctx: &mut RenderContext,
    face_size: u32,
    horizon: LinearRgba,
    zenith: LinearRgba,
) -> Result<OutputSurface, RenderError> {
    let descriptor = TextureDescriptor::cube(
        "gradient_sky_box",
        face_size,
        FormatDescriptor::RGB32F,
        FilterMode::LinearMipMap,
    );
    let surface = OutputSurface::new(ctx, descriptor)?;
    let horizon = horizon.to_vec3();
    let zenith = zenith.to_vec3();
    let ground = horizon * 0.25;

    let mut face = Vec::with_capacity((face_size * face_size * 3) as usize);
    for layer in 0..6 {
        face.clear();
        for y in 0..face_size {
            for x in 0..face_size {
                let uv = (Vec2::new(x as f32, y as f32) + 0.5) / face_size as f32;
                let up = cube_face_direction(layer, uv).normalize_or_zero().y;
                let color = if up >= 0.0 {
                    horizon.lerp(zenith, smoothstep(0.0, 1.0, up))
                } else {
                    horizon.lerp(ground, smoothstep(0.0, 0.2, -up))
                };
                face.extend_from_slice(&color.to_array());
            }
        }
        ctx.device_mut()
            .write_texture(surface.id(), layer, bytemuck::cast_slice(&face))?;
    }
    surface.generate_mipmaps(ctx)?;
    log::info!("SkyBox: generated a {face_size}x{face_size} gradient sky box");
    Ok(surface)
}

/// Binds the sky box cube map and the uniforms the environment lookups
/// share: `cube_map`, `environment_intensity` and `V_inv`, the view-to-world
/// rotation.
///
/// Returns the texture unit, which the caller frees once its draw is done.
pub fn bind_environment(
    ctx: &mut RenderContext,
    sky_box: &SkyBox,
    camera: &PerspectiveCamera,
) -> Result<u32, RenderError> {
    let unit = ctx.bind_texture(CUBE_MAP_SAMPLER, sky_box.cube_map)?;
    let view_to_world = Mat3::from_mat4(camera.absolute_transform());
    let uniforms = ctx
        .set_uniform("environment_intensity", UniformValue::Float(sky_box.intensity))
        .and_then(|()| ctx.set_uniform("V_inv", UniformValue::Mat3(view_to_world)));
    if let Err(err) = uniforms {
        ctx.free_texture_unit(unit)?;
        return Err(err);
    }
    Ok(unit)
}
