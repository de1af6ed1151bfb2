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

//! Geometry buffer fill, full-screen quads and the sky box.

use super::{
    screen_uv, FragmentContext, FragmentInput, FragmentKernel, FragmentOutput, UniformBlock,
    VertexInput, VertexKernel, VertexOutput,
};
use umbra_core::math::{Mat3, Vec4, EPSILON};

/// `geometry_pass.vert`: transforms by `P * V * M` and passes the view-space
/// position, view-space normal and texture coordinates.
#[derive(Debug)]
pub struct GeometryPassVertex;

impl VertexKernel for GeometryPassVertex {
    fn run(&self, input: &VertexInput, uniforms: &UniformBlock) -> VertexOutput {
        let model_view = uniforms.mat4("V") * uniforms.mat4("M");
        let view_position = model_view * input.position.extend(1.0);

        let linear = Mat3::from_mat4(model_view);
        let normal_matrix = if linear.determinant().abs() > EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };

        VertexOutput {
            clip: uniforms.mat4("P") * view_position,
            varyings: [
                view_position,
                (normal_matrix * input.normal).extend(0.0),
                input.tex_coord.extend(0.0).extend(0.0),
                Vec4::ZERO,
            ],
        }
    }
}

/// `geometry_pass.frag`: writes albedo, position, normal and material to
/// the four geometry buffer slots. Albedo alpha is 1 wherever geometry was
/// drawn, later passes use it as coverage.
#[derive(Debug)]
pub struct GeometryPassFragment;

impl FragmentKernel for GeometryPassFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let uniforms = context.uniforms();
        let normal = input.varyings[1].truncate().normalize_or_zero();
        Some(FragmentOutput {
            colors: [
                uniforms.vec4("albedo").truncate().extend(1.0),
                input.varyings[0].truncate().extend(1.0),
                normal.extend(1.0),
                Vec4::new(uniforms.float("roughness"), uniforms.float("metalness"), 0.0, 1.0),
            ],
        })
    }
}

/// `shading_pass.vert` and `cube_map.vert`: a full-screen quad at depth 0
/// with `[0, 1]` screen coordinates in slot 0.
#[derive(Debug)]
pub struct FullScreenVertex;

impl VertexKernel for FullScreenVertex {
    fn run(&self, input: &VertexInput, _uniforms: &UniformBlock) -> VertexOutput {
        let xy = input.position.truncate();
        VertexOutput {
            clip: Vec4::new(xy.x, xy.y, 0.0, 1.0),
            varyings: [
                (xy * 0.5 + 0.5).extend(0.0).extend(0.0),
                Vec4::ZERO,
                Vec4::ZERO,
                Vec4::ZERO,
            ],
        }
    }
}

/// `cube_map.frag`: shades background pixels with the sky box seen through
/// the camera. Pixels covered by geometry are discarded.
#[derive(Debug)]
pub struct SkyBoxFragment;

impl FragmentKernel for SkyBoxFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let uv = screen_uv(input);
        if context.sample("albedo_buffer", uv, 0.0).w > 0.0 {
            return None;
        }
        let uniforms = context.uniforms();
        let ndc = uv * 2.0 - 1.0;
        let far = uniforms.mat4("P").inverse() * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let view_direction = far.truncate() / far.w;
        let world_direction = uniforms
            .mat4("V")
            .inverse()
            .transform_vector3(view_direction);
        let intensity = uniforms.float("environment_intensity");
        let sky = context.sample_cube("cube_map", world_direction, 0.0);
        Some(FragmentOutput::single((sky.truncate() * intensity).extend(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::{Mat4, Vec2, Vec3};
    use umbra_core::renderer::UniformValue;

    #[test]
    fn test_geometry_vertex_outputs_view_space() {
        let mut uniforms = UniformBlock::default();
        uniforms.set("M", UniformValue::Mat4(Mat4::from_translation(Vec3::X)));
        uniforms.set("V", UniformValue::Mat4(Mat4::from_translation(-5.0 * Vec3::Z)));
        uniforms.set("P", UniformValue::Mat4(Mat4::IDENTITY));
        let input = VertexInput {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            tex_coord: Vec2::new(0.25, 0.75),
        };

        let out = GeometryPassVertex.run(&input, &uniforms);

        assert_eq!(out.varyings[0], Vec4::new(1.0, 0.0, -5.0, 1.0));
        assert_relative_eq!(out.varyings[1].z, 1.0);
        assert_eq!(out.varyings[2].x, 0.25);
    }

    #[test]
    fn test_normals_survive_non_uniform_scale() {
        let mut uniforms = UniformBlock::default();
        uniforms.set(
            "M",
            UniformValue::Mat4(Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0))),
        );
        uniforms.set("V", UniformValue::Mat4(Mat4::IDENTITY));
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let input = VertexInput {
            position: Vec3::ZERO,
            normal,
            tex_coord: Vec2::ZERO,
        };

        let out = GeometryPassVertex.run(&input, &uniforms);

        // The surface x = -y stretched by 4 in x has normal (1, 4, 0).
        let n = out.varyings[1].truncate().normalize();
        assert_relative_eq!(n.y / n.x, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_full_screen_vertex_maps_corners_to_uv() {
        let input = VertexInput {
            position: Vec3::new(-1.0, 1.0, 0.0),
            normal: Vec3::Z,
            tex_coord: Vec2::ZERO,
        };
        let out = FullScreenVertex.run(&input, &UniformBlock::default());
        assert_eq!(out.clip, Vec4::new(-1.0, 1.0, 0.0, 1.0));
        assert_eq!(out.varyings[0].truncate().truncate(), Vec2::new(0.0, 1.0));
    }
}
