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

//! Drives the software device through the `GraphicsDevice` contract only.

use approx::assert_relative_eq;
use std::path::Path;
use umbra_core::math::{Extent2D, Mat4, Vec2, Vec3, Vec4};
use umbra_core::renderer::{
    BlendMode, ClearFlags, FilterMode, FormatDescriptor, FramebufferDescriptor, GraphicsDevice,
    MeshData, PrimitiveTopology, ProgramId, ResourceError, ShaderError, ShaderProgramDescriptor,
    TextureDescriptor, TextureId, UniformValue, Viewport, WrappingMode,
};
use umbra_infra::graphics::software::SoftwareDevice;

const SIZE: u32 = 8;

fn quad() -> MeshData {
    let positions = vec![
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(-1.0, 1.0, 0.0),
    ];
    MeshData {
        tex_coords: positions.iter().map(|p| p.truncate() * 0.5 + 0.5).collect(),
        normals: vec![Vec3::Z; 4],
        positions,
        indices: vec![0, 1, 2, 2, 3, 0],
        topology: PrimitiveTopology::Triangles,
    }
}

fn program(device: &mut SoftwareDevice, dir: &Path, vertex: &str, fragment: &str) -> ProgramId {
    let vertex_path = dir.join(format!("{vertex}.vert"));
    let fragment_path = dir.join(format!("{fragment}.frag"));
    std::fs::write(&vertex_path, "void main() {}").unwrap();
    std::fs::write(&fragment_path, "void main() {}").unwrap();
    device
        .create_program(&ShaderProgramDescriptor::new(
            fragment,
            vertex_path,
            fragment_path,
        ))
        .unwrap()
}

fn target(device: &mut SoftwareDevice, label: &str, format: FormatDescriptor) -> TextureId {
    device
        .create_texture(&TextureDescriptor::new_2d(
            label,
            SIZE,
            SIZE,
            format,
            FilterMode::Nearest,
            WrappingMode::ClampToEdge,
        ))
        .unwrap()
}

fn center(texels: &[Vec4]) -> Vec4 {
    let half = SIZE / 2;
    texels[(half * SIZE + half) as usize]
}

struct GBuffer {
    framebuffer: umbra_core::renderer::FramebufferId,
    textures: [TextureId; 4],
}

fn gbuffer(device: &mut SoftwareDevice) -> GBuffer {
    let textures = [
        target(device, "albedo_buffer", FormatDescriptor::RGBA8),
        target(device, "position_buffer", FormatDescriptor::RGB16F),
        target(device, "normal_buffer", FormatDescriptor::RGB16F),
        target(device, "material_buffer", FormatDescriptor::RGB16F),
    ];
    let framebuffer = device
        .create_framebuffer(&FramebufferDescriptor {
            label: "geometry".to_string(),
            size: Extent2D::new(SIZE, SIZE),
            color_attachments: textures.to_vec(),
            depth: true,
        })
        .unwrap();
    GBuffer {
        framebuffer,
        textures,
    }
}

fn draw_geometry(device: &mut SoftwareDevice, mesh: umbra_core::renderer::MeshId, z: f32, albedo: Vec4) {
    device
        .set_uniform("M", UniformValue::Mat4(Mat4::from_translation(Vec3::Z * z)))
        .unwrap();
    device
        .set_uniform("albedo", UniformValue::Vec4(albedo))
        .unwrap();
    device.draw_mesh(mesh).unwrap();
}

#[test]
fn depth_test_keeps_the_nearest_surface_in_any_order() {
    for near_first in [true, false] {
        // --- 1. ARRANGE ---
        let dir = tempfile::tempdir().unwrap();
        let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
        let gbuffer = gbuffer(&mut device);
        let geometry = program(&mut device, dir.path(), "geometry_pass", "geometry_pass");
        let mesh = device.create_mesh(quad()).unwrap();
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);

        // --- 2. ACT ---
        device.bind_framebuffer(Some(gbuffer.framebuffer)).unwrap();
        device.set_viewport(Viewport::from_size(SIZE, SIZE));
        device.clear(ClearFlags::ALL, Vec4::ZERO);
        device.set_depth_test(true);
        device.use_program(Some(geometry)).unwrap();
        device.set_uniform("V", UniformValue::Mat4(Mat4::IDENTITY)).unwrap();
        device.set_uniform("P", UniformValue::Mat4(Mat4::IDENTITY)).unwrap();
        let draws = if near_first {
            [(-0.5, red), (0.5, blue)]
        } else {
            [(0.5, blue), (-0.5, red)]
        };
        for (z, albedo) in draws {
            draw_geometry(&mut device, mesh, z, albedo);
        }

        // --- 3. ASSERT ---
        let albedo = device.read_texture(gbuffer.textures[0], 0, 0).unwrap();
        let position = device.read_texture(gbuffer.textures[1], 0, 0).unwrap();
        assert_eq!(center(&albedo), red);
        assert_relative_eq!(center(&position).z, -0.5);
        assert_eq!(device.stats().draw_calls, 2);
    }
}

#[test]
fn additive_blending_accumulates_lights() {
    // --- 1. ARRANGE ---
    let dir = tempfile::tempdir().unwrap();
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let gbuffer = gbuffer(&mut device);
    let geometry = program(&mut device, dir.path(), "geometry_pass", "geometry_pass");
    let light = program(&mut device, dir.path(), "shading_pass", "shading_pass_directional_light");
    let irradiance = target(&mut device, "irradiance_buffer", FormatDescriptor::RGBA16F);
    let light_target = device
        .create_framebuffer(&FramebufferDescriptor {
            label: "light".to_string(),
            size: Extent2D::new(SIZE, SIZE),
            color_attachments: vec![irradiance],
            depth: false,
        })
        .unwrap();
    let mesh = device.create_mesh(quad()).unwrap();

    device.bind_framebuffer(Some(gbuffer.framebuffer)).unwrap();
    device.clear(ClearFlags::ALL, Vec4::ZERO);
    device.use_program(Some(geometry)).unwrap();
    device.set_uniform("V", UniformValue::Mat4(Mat4::IDENTITY)).unwrap();
    device.set_uniform("P", UniformValue::Mat4(Mat4::IDENTITY)).unwrap();
    device.set_uniform("roughness", UniformValue::Float(1.0)).unwrap();
    draw_geometry(&mut device, mesh, -0.5, Vec4::ONE);

    // --- 2. ACT ---
    device.bind_framebuffer(Some(light_target)).unwrap();
    device.clear(ClearFlags::COLOR, Vec4::ZERO);
    device.set_blend_mode(BlendMode::Additive);
    device.use_program(Some(light)).unwrap();
    let samplers = ["albedo_buffer", "position_buffer", "normal_buffer", "material_buffer"];
    for (unit, (name, texture)) in samplers.iter().zip(gbuffer.textures).enumerate() {
        device.bind_texture_unit(unit as u32, Some(texture)).unwrap();
        device
            .set_uniform(name, UniformValue::Int(unit as i32))
            .unwrap();
    }
    device
        .set_uniform("light_direction", UniformValue::Vec3(-Vec3::Z))
        .unwrap();
    device
        .set_uniform("light_color", UniformValue::Vec3(Vec3::ONE))
        .unwrap();
    device
        .set_uniform("light_intensity", UniformValue::Float(0.25))
        .unwrap();
    device.draw_mesh(mesh).unwrap();
    let once = center(&device.read_texture(irradiance, 0, 0).unwrap());
    device.draw_mesh(mesh).unwrap();
    let twice = center(&device.read_texture(irradiance, 0, 0).unwrap());

    // --- 3. ASSERT ---
    assert!(once.x > 0.25, "{once:?}");
    assert_relative_eq!(twice.x, once.x * 2.0, epsilon = 1e-2);
    assert_eq!(device.take_error(), None);
}

#[test]
fn sampling_a_bound_attachment_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let copy = program(&mut device, dir.path(), "shading_pass", "shading_pass_irradiance");
    let irradiance = target(&mut device, "irradiance_buffer", FormatDescriptor::RGBA16F);
    let framebuffer = device
        .create_framebuffer(&FramebufferDescriptor {
            label: "feedback".to_string(),
            size: Extent2D::new(SIZE, SIZE),
            color_attachments: vec![irradiance],
            depth: false,
        })
        .unwrap();
    let mesh = device.create_mesh(quad()).unwrap();

    device.bind_framebuffer(Some(framebuffer)).unwrap();
    device.bind_texture_unit(0, Some(irradiance)).unwrap();
    device.use_program(Some(copy)).unwrap();
    device.draw_mesh(mesh).unwrap();

    let error = device.take_error().expect("a feedback loop should be reported");
    assert!(error.contains("attached"), "{error}");
    assert_eq!(device.take_error(), None);
}

#[test]
fn framebuffer_completeness_is_checked() {
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let small = device
        .create_texture(&TextureDescriptor::new_2d(
            "small",
            SIZE / 2,
            SIZE,
            FormatDescriptor::RGBA8,
            FilterMode::Nearest,
            WrappingMode::ClampToEdge,
        ))
        .unwrap();
    let mismatched = FramebufferDescriptor {
        label: "mismatched".to_string(),
        size: Extent2D::new(SIZE, SIZE),
        color_attachments: vec![small],
        depth: false,
    };
    let empty = FramebufferDescriptor {
        label: "empty".to_string(),
        size: Extent2D::new(SIZE, SIZE),
        color_attachments: Vec::new(),
        depth: false,
    };

    assert!(matches!(
        device.create_framebuffer(&mismatched),
        Err(ResourceError::FramebufferIncomplete(_))
    ));
    assert!(matches!(
        device.create_framebuffer(&empty),
        Err(ResourceError::FramebufferIncomplete(_))
    ));
}

#[test]
fn uniforms_need_an_active_program() {
    let dir = tempfile::tempdir().unwrap();
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let copy = program(&mut device, dir.path(), "shading_pass", "final_pass_through");

    assert!(device
        .set_uniform("window_size", UniformValue::Float(1.0))
        .is_err());

    device.use_program(Some(copy)).unwrap();
    device
        .set_uniform("focus", UniformValue::Float(2.0))
        .unwrap();
    device.use_program(None).unwrap();

    // Values persist on the program after it is deactivated.
    assert_eq!(
        device.program_uniform("final_pass_through", "focus"),
        Some(UniformValue::Float(2.0))
    );
}

#[test]
fn draw_without_program_is_recorded() {
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let mesh = device.create_mesh(quad()).unwrap();

    device.draw_mesh(mesh).unwrap();

    assert!(device.take_error().is_some());
    assert_eq!(device.stats().draw_calls, 0);
}

#[test]
fn invalid_meshes_are_rejected() {
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let mut mesh = quad();
    mesh.indices.push(9);
    assert!(matches!(
        device.create_mesh(mesh),
        Err(ResourceError::InvalidMeshData(_))
    ));
}

#[test]
fn missing_program_is_not_found() {
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    assert!(matches!(
        device.use_program(Some(ProgramId(42))),
        Err(ResourceError::Shader(ShaderError::NotFound { .. }))
    ));
}

#[test]
fn byte_uploads_round_trip_through_mips() {
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let texture = device
        .create_texture(&TextureDescriptor::new_2d(
            "checker",
            2,
            2,
            FormatDescriptor::RGBA8,
            FilterMode::LinearMipMap,
            WrappingMode::Repeat,
        ))
        .unwrap();
    let pixels = [255u8, 255, 255, 255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255, 255];

    device.write_texture(texture, 0, &pixels).unwrap();
    assert_eq!(device.has_stale_mips(texture), Some(true));
    device.generate_mipmaps(texture).unwrap();

    let base = device.read_texture(texture, 0, 0).unwrap();
    let top = device.read_texture(texture, 1, 0).unwrap();
    assert_eq!(base[0], Vec4::ONE);
    assert_eq!(top.len(), 1);
    assert_relative_eq!(top[0].x, 128.0 / 255.0);
    assert!(matches!(
        device.read_texture(texture, 2, 0),
        Err(ResourceError::OutOfBounds)
    ));
    assert!(device.write_texture(texture, 0, &pixels[..8]).is_err());
}

#[test]
fn final_pass_writes_the_surface() {
    let dir = tempfile::tempdir().unwrap();
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let copy = program(&mut device, dir.path(), "shading_pass", "final_pass_through");
    let color = device
        .create_texture(&TextureDescriptor::new_2d(
            "color_buffer",
            1,
            1,
            FormatDescriptor::RGB8,
            FilterMode::Linear,
            WrappingMode::ClampToEdge,
        ))
        .unwrap();
    device.write_texture(color, 0, &[255, 51, 0]).unwrap();
    let mesh = device.create_mesh(quad()).unwrap();

    device.bind_framebuffer(None).unwrap();
    device.set_viewport(Viewport::from_size(SIZE, SIZE));
    device.bind_texture_unit(3, Some(color)).unwrap();
    device.use_program(Some(copy)).unwrap();
    device
        .set_uniform("color_buffer", UniformValue::Int(3))
        .unwrap();
    device
        .set_uniform(
            "window_size",
            UniformValue::IVec2(Vec2::splat(SIZE as f32).as_ivec2()),
        )
        .unwrap();
    device.draw_mesh(mesh).unwrap();

    let surface = device.read_surface();
    assert_eq!(surface.len(), (SIZE * SIZE) as usize);
    assert!(surface
        .iter()
        .all(|texel| *texel == Vec4::new(1.0, 0.2, 0.0, 1.0)));
    assert_eq!(device.stats().fragments, (SIZE * SIZE) as u64);
}
