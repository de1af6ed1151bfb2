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

//! Light instances submitted for one frame.
//!
//! A scene node holding a light submits the light together with its world
//! transform. The light accumulation pass then draws every instance once,
//! in view space, into the light buffer.

use super::context::RenderContext;
use umbra_core::math::{Mat4, Vec3};
use umbra_core::renderer::{
    DirectionalLight, MeshId, PerspectiveCamera, PointLight, RenderError, UniformValue,
};

/// A light that can shade the geometry buffer.
pub trait LightSource {
    /// Uploads the light parameters to the active program and draws `quad`
    /// into the bound light target.
    ///
    /// # Arguments
    ///
    /// * `ctx`: The context, with the program of this light kind active and
    ///   the geometry buffer bound for sampling.
    /// * `camera`: The camera the frame is rendered from. Lights are shaded in
    ///   its view space.
    /// * `quad`: The full-screen quad of the light target.
    fn render(
        &self,
        ctx: &mut RenderContext,
        camera: &PerspectiveCamera,
        quad: MeshId,
    ) -> Result<(), RenderError>;
}

/// A point light placed by its node's world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightSource {
    /// Photometric parameters.
    pub light: PointLight,
    /// World transform of the node holding the light.
    pub world_transform: Mat4,
}

impl PointLightSource {
    /// World-space position of the light.
    pub fn position(&self) -> Vec3 {
        self.world_transform.w_axis.truncate()
    }
}

impl LightSource for PointLightSource {
    fn render(
        &self,
        ctx: &mut RenderContext,
        camera: &PerspectiveCamera,
        quad: MeshId,
    ) -> Result<(), RenderError> {
        let view_position = camera.view_transform().transform_point3(self.position());
        ctx.set_uniform("light_position", UniformValue::Vec3(view_position))?;
        ctx.set_uniform("light_color", UniformValue::Vec3(self.light.color.to_vec3()))?;
        ctx.set_uniform("light_intensity", UniformValue::Float(self.light.intensity))?;
        ctx.set_uniform("light_radius", UniformValue::Float(self.light.radius))?;
        ctx.draw_mesh(quad)
    }
}

/// A directional light aimed by its node's world transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightSource {
    /// Photometric parameters.
    pub light: DirectionalLight,
    /// World transform of the node holding the light.
    pub world_transform: Mat4,
}

impl DirectionalLightSource {
    /// World-space direction the light travels in: the node's local `-Z`.
    pub fn direction(&self) -> Vec3 {
        self.world_transform
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or(Vec3::NEG_Z)
    }
}

impl LightSource for DirectionalLightSource {
    fn render(
        &self,
        ctx: &mut RenderContext,
        camera: &PerspectiveCamera,
        quad: MeshId,
    ) -> Result<(), RenderError> {
        let view_direction = camera
            .view_transform()
            .transform_vector3(self.direction())
            .normalize_or_zero();
        ctx.set_uniform("light_direction", UniformValue::Vec3(view_direction))?;
        ctx.set_uniform("light_color", UniformValue::Vec3(self.light.color.to_vec3()))?;
        ctx.set_uniform("light_intensity", UniformValue::Float(self.light.intensity))?;
        ctx.draw_mesh(quad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::{Quat, FRAC_PI_2};

    #[test]
    fn test_point_light_position_is_the_transform_translation() {
        let source = PointLightSource {
            light: PointLight::default(),
            world_transform: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
        };
        assert_eq!(source.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_directional_light_shines_along_local_negative_z() {
        let identity = DirectionalLightSource {
            light: DirectionalLight::default(),
            world_transform: Mat4::IDENTITY,
        };
        assert_eq!(identity.direction(), Vec3::NEG_Z);

        // Pitching down by 90 degrees points the light at the floor.
        let down = DirectionalLightSource {
            light: DirectionalLight::default(),
            world_transform: Mat4::from_quat(Quat::from_rotation_x(-FRAC_PI_2))
                * Mat4::from_scale(Vec3::splat(3.0)),
        };
        let direction = down.direction();
        assert_relative_eq!(direction.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(direction.length(), 1.0, epsilon = 1e-5);
    }
}
