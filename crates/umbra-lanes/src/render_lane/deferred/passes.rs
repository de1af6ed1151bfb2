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

//! The passes of a frame, in execution order.

use super::lens::DepthOfFieldUniforms;
use super::DeferredShadingRenderer;
use crate::render_lane::sky_box::bind_environment;
use crate::render_lane::{
    DirectionalLightSource, LightSource, PointLightSource, RenderContext, RenderTarget,
    ShaderProgram,
};
use umbra_core::math::{Extent2D, IVec2, Mat4, Vec3, Vec4};
use umbra_core::renderer::{
    BlendMode, ClearFlags, RenderError, Renderable, ResourceError, SkyBox, UniformValue, Viewport,
};

/// Activates `program`, exposes the attachments of `inputs` to it, runs
/// `draw` and releases everything again.
fn screen_pass(
    ctx: &mut RenderContext,
    program: &ShaderProgram,
    inputs: &[&RenderTarget],
    draw: impl FnOnce(&mut RenderContext) -> Result<(), RenderError>,
) -> Result<(), RenderError> {
    let mut scope = ctx.use_program(program)?;
    for input in inputs {
        input.bind_textures(&mut scope)?;
    }
    draw(&mut *scope)?;
    for input in inputs {
        input.free_texture_units(&mut scope)?;
    }
    Ok(())
}

/// Maps view space to `[0, 1]` texture coordinates of the screen.
fn view_to_texture(projection: Mat4) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.5, 0.5, 0.0))
        * Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0))
        * projection
}

fn size_uniform(target: &RenderTarget) -> UniformValue {
    UniformValue::IVec2(IVec2::new(target.width() as i32, target.height() as i32))
}

impl DeferredShadingRenderer {
    pub(super) fn geometry_pass(
        &self,
        ctx: &mut RenderContext,
        renderables: &[Renderable],
    ) -> Result<(), RenderError> {
        let target = &self.targets.geometry;
        target.bind(ctx)?;
        target.clear(ctx, Vec4::ZERO);
        ctx.set_depth_test(true);
        ctx.set_blend_mode(BlendMode::Disabled);
        ctx.set_cull_face(true);
        {
            let mut scope = ctx.use_program(&self.programs.gbuffer)?;
            scope.set_uniform("V", UniformValue::Mat4(self.camera.view_transform()))?;
            scope.set_uniform("P", UniformValue::Mat4(self.camera.projection_transform()))?;
            for renderable in renderables {
                let material = &renderable.material;
                scope.set_uniform("M", UniformValue::Mat4(renderable.world_transform))?;
                scope.set_uniform("albedo", UniformValue::Vec4(material.albedo.to_vec4()))?;
                scope.set_uniform("roughness", UniformValue::Float(material.roughness))?;
                scope.set_uniform("metalness", UniformValue::Float(material.metalness))?;
                match scope.draw_mesh(renderable.mesh) {
                    Err(RenderError::ResourceError(ResourceError::NotFound)) => {
                        log::warn!(
                            "DeferredShadingRenderer: skipping unknown {:?}",
                            renderable.mesh
                        );
                    }
                    other => other?,
                }
            }
        }
        ctx.set_cull_face(false);
        target.unbind(ctx)
    }

    pub(super) fn light_pass(
        &self,
        ctx: &mut RenderContext,
        point_lights: &[PointLightSource],
        directional_lights: &[DirectionalLightSource],
        sky_box: Option<&SkyBox>,
    ) -> Result<(), RenderError> {
        let target = &self.targets.light;
        let geometry = &self.targets.geometry;
        let camera = &self.camera;
        let quad = target.quad();

        target.bind(ctx)?;
        target.clear(ctx, Vec4::ZERO);
        ctx.set_depth_test(false);
        ctx.set_blend_mode(BlendMode::Additive);

        screen_pass(ctx, &self.programs.point_lights, &[geometry], |ctx| {
            for light in point_lights {
                light.render(ctx, camera, quad)?;
            }
            Ok(())
        })?;
        screen_pass(ctx, &self.programs.directional_lights, &[geometry], |ctx| {
            for light in directional_lights {
                light.render(ctx, camera, quad)?;
            }
            Ok(())
        })?;

        if let Some(sky_box) = sky_box {
            screen_pass(ctx, &self.programs.environment_diffuse, &[geometry], |ctx| {
                let unit = bind_environment(ctx, sky_box, camera)?;
                target.render(ctx)?;
                ctx.free_texture_unit(unit)
            })?;
            screen_pass(ctx, &self.programs.cube_map, &[geometry], |ctx| {
                let unit = bind_environment(ctx, sky_box, camera)?;
                ctx.set_uniform("V", UniformValue::Mat4(camera.view_transform()))?;
                ctx.set_uniform("P", UniformValue::Mat4(camera.projection_transform()))?;
                target.render(ctx)?;
                ctx.free_texture_unit(unit)
            })?;
        }

        ctx.set_blend_mode(BlendMode::Disabled);
        target.unbind(ctx)
    }

    pub(super) fn reflection_pass(
        &self,
        ctx: &mut RenderContext,
        sky_box: Option<&SkyBox>,
    ) -> Result<(), RenderError> {
        let target = &self.targets.final_irradiance;
        let light = &self.targets.light;
        let camera = &self.camera;

        target.bind(ctx)?;
        target.clear(ctx, Vec4::ZERO);
        ctx.set_blend_mode(BlendMode::Disabled);

        match sky_box {
            Some(sky_box) => {
                let inputs = [light, &self.targets.geometry];
                screen_pass(ctx, &self.programs.reflection, &inputs, |ctx| {
                    let unit = bind_environment(ctx, sky_box, camera)?;
                    let p_frag = view_to_texture(camera.projection_transform());
                    ctx.set_uniform("P_frag", UniformValue::Mat4(p_frag))?;
                    target.render(ctx)?;
                    ctx.free_texture_unit(unit)
                })?;
            }
            None => {
                screen_pass(ctx, &self.programs.irradiance, &[light], |ctx| {
                    target.render(ctx)
                })?;
            }
        }

        target.unbind(ctx)
    }

    pub(super) fn highlight_pass(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        let target = &self.targets.post_process;
        let source = &self.targets.final_irradiance;

        target.bind(ctx)?;
        target.clear(ctx, Vec4::ZERO);
        screen_pass(ctx, &self.programs.output_highlights, &[source], |ctx| {
            ctx.set_uniform("window_size", size_uniform(target))?;
            target.render(ctx)
        })?;
        target.unbind(ctx)
    }

    pub(super) fn post_process_pass(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        let target = &self.targets.final_pass_through;
        let bloom = &self.targets.post_process;
        let inputs = [&self.targets.final_irradiance, bloom, &self.targets.geometry];
        let depth_of_field = DepthOfFieldUniforms::from_camera(
            &self.camera,
            Extent2D::new(target.width(), target.height()),
        );
        let projection = self.camera.projection_transform();

        target.bind(ctx)?;
        target.clear(ctx, Vec4::ZERO);
        screen_pass(ctx, &self.programs.post_process, &inputs, |ctx| {
            ctx.set_uniform("window_size", size_uniform(target))?;
            ctx.set_uniform("P_inv", UniformValue::Mat4(projection.inverse()))?;
            ctx.set_uniform("bloom_buffer_base_size", size_uniform(bloom))?;
            depth_of_field.upload(ctx)?;
            target.render(ctx)
        })?;
        target.unbind(ctx)
    }

    pub(super) fn final_composite(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        let source = &self.targets.final_pass_through;
        let window = self.window_resolution();

        if ctx.device().surface_size() != window {
            ctx.device_mut().resize_surface(window.width, window.height);
        }
        ctx.set_viewport(Viewport::from_size(window.width, window.height));
        ctx.set_depth_test(false);
        ctx.set_blend_mode(BlendMode::Disabled);
        ctx.clear(ClearFlags::ALL, Vec4::ZERO);

        screen_pass(ctx, &self.programs.final_pass_through, &[source], |ctx| {
            ctx.set_uniform(
                "window_size",
                UniformValue::IVec2(IVec2::new(window.width as i32, window.height as i32)),
            )?;
            source.render(ctx)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::renderer::PerspectiveCamera;

    #[test]
    fn test_view_to_texture_maps_the_view_center_to_the_screen_center() {
        let camera = PerspectiveCamera::default();
        let projection = view_to_texture(camera.projection_transform());

        let clip = projection * Vec4::new(0.0, 0.0, -5.0, 1.0);
        let uv = clip.truncate().truncate() / clip.w;

        assert_relative_eq!(uv.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(uv.y, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_view_to_texture_maps_frustum_edges_to_unit_range() {
        let camera = PerspectiveCamera::new(90f32.to_radians(), 1.0, 0.1, 100.0);
        let projection = view_to_texture(camera.projection_transform());

        // With a 90 degree field of view, x = -z lies on the right edge.
        let clip = projection * Vec4::new(2.0, -2.0, -2.0, 1.0);
        let uv = clip.truncate().truncate() / clip.w;

        assert_relative_eq!(uv.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(uv.y, 0.0, epsilon = 1e-5);
    }
}
