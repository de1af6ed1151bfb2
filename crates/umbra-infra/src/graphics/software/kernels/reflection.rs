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

//! Screen-space reflections with a cube map fallback.

use super::lighting::Surface;
use super::{screen_uv, FragmentContext, FragmentInput, FragmentKernel, FragmentOutput};
use umbra_core::math::{fresnel_schlick, reflect, Vec2, Vec3, EPSILON};
use umbra_core::renderer::TextureDimension;

const MAX_STEPS: u32 = 48;
const STEP_LENGTH: f32 = 0.1;
/// How far behind a stored surface a ray may be and still count as a hit.
const THICKNESS: f32 = 0.25;

/// `shading_pass_reflection.frag`.
///
/// Marches the reflected view ray in view space, projecting each step with
/// `P_frag` (view space to `[0, 1]` texture coordinates). A hit reads the
/// irradiance buffer at a mip level that grows with roughness; a miss reads
/// the sky box. Background pixels pass the irradiance through.
#[derive(Debug)]
pub struct ReflectionFragment;

impl FragmentKernel for ReflectionFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let uv = screen_uv(input);
        let irradiance = context.sample("irradiance_buffer", uv, 0.0);
        let Some(surface) = Surface::read(context, uv) else {
            return Some(FragmentOutput::single(irradiance));
        };
        let uniforms = context.uniforms();

        let view_direction = surface.position.normalize_or_zero();
        let direction = reflect(view_direction, surface.normal);
        let reflected = match march(context, surface.position, direction) {
            Some(hit) => {
                let lod = surface.roughness * context.max_lod("irradiance_buffer", TextureDimension::D2);
                context.sample("irradiance_buffer", hit, lod).truncate()
            }
            None => {
                let world_direction = uniforms.mat3("V_inv") * direction;
                let lod = surface.roughness * context.max_lod("cube_map", TextureDimension::Cube);
                context.sample_cube("cube_map", world_direction, lod).truncate()
                    * uniforms.float("environment_intensity")
            }
        };

        let fresnel = fresnel_schlick(surface.normal.dot(-view_direction), surface.f0());
        let color = irradiance.truncate() + fresnel * reflected * (1.0 - surface.roughness);
        Some(FragmentOutput::single(color.extend(irradiance.w)))
    }
}

fn march(context: &FragmentContext<'_>, origin: Vec3, direction: Vec3) -> Option<Vec2> {
    let projection = context.uniforms().mat4("P_frag");
    for step in 1..=MAX_STEPS {
        let point = origin + direction * (STEP_LENGTH * step as f32);
        let clip = projection * point.extend(1.0);
        if clip.w <= EPSILON {
            return None;
        }
        let uv = clip.truncate().truncate() / clip.w;
        if uv.cmplt(Vec2::ZERO).any() || uv.cmpgt(Vec2::ONE).any() {
            return None;
        }
        if context.sample("albedo_buffer", uv, 0.0).w <= 0.0 {
            continue;
        }
        let gap = context.sample("position_buffer", uv, 0.0).z - point.z;
        if gap > 0.0 && gap < THICKNESS {
            return Some(uv);
        }
    }
    None
}
