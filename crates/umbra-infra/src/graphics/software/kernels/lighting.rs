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

//! Light accumulation kernels.
//!
//! Every light is evaluated per pixel from the geometry buffer and added to
//! the irradiance buffer by the additive blend state.

use super::{screen_uv, FragmentContext, FragmentInput, FragmentKernel, FragmentOutput};
use umbra_core::math::{fresnel_schlick, Vec2, Vec3, Vec4, EPSILON, PI};
use umbra_core::renderer::TextureDimension;

/// A decoded geometry buffer texel.
#[derive(Debug, Clone, Copy)]
pub(super) struct Surface {
    pub albedo: Vec3,
    pub position: Vec3,
    pub normal: Vec3,
    pub roughness: f32,
    pub metalness: f32,
}

impl Surface {
    /// Reads the geometry buffer at `uv`. `None` where no geometry was
    /// drawn.
    pub fn read(context: &FragmentContext<'_>, uv: Vec2) -> Option<Self> {
        let albedo = context.sample("albedo_buffer", uv, 0.0);
        if albedo.w <= 0.0 {
            return None;
        }
        let material = context.sample("material_buffer", uv, 0.0);
        Some(Self {
            albedo: albedo.truncate(),
            position: context.sample("position_buffer", uv, 0.0).truncate(),
            normal: context
                .sample("normal_buffer", uv, 0.0)
                .truncate()
                .normalize_or_zero(),
            roughness: material.x.clamp(0.0, 1.0),
            metalness: material.y.clamp(0.0, 1.0),
        })
    }

    /// Reflectance at normal incidence.
    pub fn f0(&self) -> Vec3 {
        Vec3::splat(0.04).lerp(self.albedo, self.metalness)
    }

    /// Lambert diffuse plus normalized Blinn-Phong specular for light
    /// arriving from `to_light` with `radiance`.
    pub fn shade(&self, to_light: Vec3, radiance: Vec3) -> Vec3 {
        let n_dot_l = self.normal.dot(to_light);
        if n_dot_l <= 0.0 {
            return Vec3::ZERO;
        }
        let to_eye = (-self.position).normalize_or_zero();
        let half = (to_light + to_eye).normalize_or_zero();

        let shininess = 2.0 / self.roughness.powi(4).max(1e-4) - 2.0;
        let normalization = (shininess + 8.0) / (8.0 * PI);
        let specular = fresnel_schlick(half.dot(to_eye), self.f0())
            * normalization
            * self.normal.dot(half).max(0.0).powf(shininess);
        let diffuse = self.albedo * (1.0 - self.metalness);

        (diffuse + specular) * radiance * n_dot_l
    }
}

/// Smooth windowed inverse-square falloff reaching zero at `radius`.
pub(super) fn point_light_attenuation(distance: f32, intensity: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let window = (1.0 - (distance / radius).powi(4)).clamp(0.0, 1.0);
    intensity / (1.0 + distance * distance) * window * window
}

/// `shading_pass_point_light.frag`.
#[derive(Debug)]
pub struct PointLightFragment;

impl FragmentKernel for PointLightFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let surface = Surface::read(context, screen_uv(input))?;
        let uniforms = context.uniforms();

        let offset = uniforms.vec3("light_position") - surface.position;
        let distance = offset.length();
        let to_light = if distance > EPSILON {
            offset / distance
        } else {
            surface.normal
        };
        let attenuation = point_light_attenuation(
            distance,
            uniforms.float("light_intensity"),
            uniforms.float("light_radius"),
        );
        let radiance = uniforms.vec3("light_color") * attenuation;
        Some(FragmentOutput::single(
            surface.shade(to_light, radiance).extend(0.0),
        ))
    }
}

/// `shading_pass_directional_light.frag`.
#[derive(Debug)]
pub struct DirectionalLightFragment;

impl FragmentKernel for DirectionalLightFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let surface = Surface::read(context, screen_uv(input))?;
        let uniforms = context.uniforms();
        let to_light = -uniforms.vec3("light_direction").normalize_or_zero();
        let radiance = uniforms.vec3("light_color") * uniforms.float("light_intensity");
        Some(FragmentOutput::single(
            surface.shade(to_light, radiance).extend(0.0),
        ))
    }
}

/// `shading_pass_environment_diffuse.frag`: ambient light from the most
/// blurred level of the sky box around the world-space normal.
#[derive(Debug)]
pub struct EnvironmentDiffuseFragment;

impl FragmentKernel for EnvironmentDiffuseFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let surface = Surface::read(context, screen_uv(input))?;
        let uniforms = context.uniforms();
        let world_normal = uniforms.mat3("V_inv") * surface.normal;
        let lod = context.max_lod("cube_map", TextureDimension::Cube);
        let environment = context.sample_cube("cube_map", world_normal, lod).truncate()
            * uniforms.float("environment_intensity");
        let diffuse = surface.albedo * (1.0 - surface.metalness);
        Some(FragmentOutput::single((diffuse * environment).extend(0.0)))
    }
}

/// `shading_pass_irradiance.frag`: copies the irradiance buffer texel for
/// texel.
#[derive(Debug)]
pub struct IrradiancePassThrough;

impl FragmentKernel for IrradiancePassThrough {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let coord = input.frag_coord.truncate().truncate().floor().as_ivec2();
        Some(FragmentOutput::single(
            context.texel_fetch("irradiance_buffer", coord, 0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::{center_fragment, Fixture};
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::Mat3;
    use umbra_core::renderer::UniformValue;

    /// A white dielectric facing the camera, two units in front of it.
    fn gbuffer(roughness: f32) -> Fixture {
        let mut fixture = Fixture::default();
        fixture
            .bind("albedo_buffer", Vec4::ONE)
            .bind("position_buffer", Vec4::new(0.0, 0.0, -2.0, 1.0))
            .bind("normal_buffer", Vec4::new(0.0, 0.0, 1.0, 1.0))
            .bind("material_buffer", Vec4::new(roughness, 0.0, 0.0, 1.0));
        fixture
    }

    #[test]
    fn test_directional_light_facing_surface_is_lit() {
        // --- 1. ARRANGE ---
        let mut fixture = gbuffer(1.0);
        fixture
            .set("light_direction", UniformValue::Vec3(-Vec3::Z))
            .set("light_color", UniformValue::Vec3(Vec3::ONE))
            .set("light_intensity", UniformValue::Float(1.0));

        // --- 2. ACT ---
        let out = DirectionalLightFragment
            .run(&center_fragment(), &fixture.context())
            .unwrap();

        // --- 3. ASSERT ---
        // Full diffuse plus a small specular lobe.
        let lit = out.colors[0];
        assert!(lit.x >= 1.0 && lit.x < 1.2, "{lit:?}");
        assert_eq!(lit.x, lit.y);
        assert!(fixture.diagnostics.borrow().is_empty());
    }

    #[test]
    fn test_light_from_behind_contributes_nothing() {
        let mut fixture = gbuffer(0.5);
        fixture
            .set("light_direction", UniformValue::Vec3(Vec3::Z))
            .set("light_color", UniformValue::Vec3(Vec3::ONE))
            .set("light_intensity", UniformValue::Float(1.0));

        let out = DirectionalLightFragment
            .run(&center_fragment(), &fixture.context())
            .unwrap();

        assert_eq!(out.colors[0], Vec4::ZERO);
    }

    #[test]
    fn test_background_pixels_are_discarded() {
        let mut fixture = gbuffer(0.5);
        fixture.bind("albedo_buffer", Vec4::ZERO);
        assert!(PointLightFragment
            .run(&center_fragment(), &fixture.context())
            .is_none());
    }

    #[test]
    fn test_point_light_attenuation_window() {
        assert_relative_eq!(point_light_attenuation(0.0, 2.0, 5.0), 2.0);
        assert_eq!(point_light_attenuation(5.0, 2.0, 5.0), 0.0);
        assert_eq!(point_light_attenuation(7.0, 2.0, 5.0), 0.0);
        assert!(point_light_attenuation(1.0, 2.0, 5.0) < 1.0);
        assert_eq!(point_light_attenuation(0.0, 2.0, 0.0), 0.0);
    }

    #[test]
    fn test_point_light_out_of_range_is_dark() {
        let mut fixture = gbuffer(0.5);
        fixture
            .set("light_position", UniformValue::Vec3(Vec3::new(0.0, 0.0, 10.0)))
            .set("light_color", UniformValue::Vec3(Vec3::ONE))
            .set("light_intensity", UniformValue::Float(1.0))
            .set("light_radius", UniformValue::Float(3.0));

        let out = PointLightFragment
            .run(&center_fragment(), &fixture.context())
            .unwrap();

        assert_eq!(out.colors[0], Vec4::ZERO);
    }

    #[test]
    fn test_environment_diffuse_uses_world_normal() {
        let mut fixture = gbuffer(0.5);
        fixture
            .bind_cube("cube_map", Vec4::new(0.5, 0.25, 1.0, 1.0))
            .set("V_inv", UniformValue::Mat3(Mat3::IDENTITY))
            .set("environment_intensity", UniformValue::Float(2.0));

        let out = EnvironmentDiffuseFragment
            .run(&center_fragment(), &fixture.context())
            .unwrap();

        assert_eq!(out.colors[0], Vec4::new(1.0, 0.5, 2.0, 0.0));
    }
}
