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

//! Renders whole frames through the deferred renderer on the software
//! device and inspects the targets each pass leaves behind.

use approx::assert_relative_eq;
use std::path::PathBuf;
use umbra_core::math::{Extent2D, IVec2, LinearRgba, Mat4, Vec3, Vec4};
use umbra_core::renderer::{
    DirectionalLight, Material, PerspectiveCamera, RenderError, ResourceError, ShaderError,
    SkyBox, UniformValue, Viewport,
};
use umbra_data::mesh;
use umbra_data::scene::{NodeId, NodePayload, SceneGraph};
use umbra_infra::graphics::software::SoftwareDevice;
use umbra_lanes::deferred::{
    inv_focal_ratio_in_pixels, DeferredShadingRenderer, FramePhase, RendererConfig,
};
use umbra_lanes::sky_box::gradient_sky_box;
use umbra_lanes::RenderContext;

const SIZE: u32 = 256;

fn shader_root() -> PathBuf {
    PathBuf::from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../assets/shaders/deferred_shading"
    ))
}

fn setup(width: u32, height: u32) -> (RenderContext, DeferredShadingRenderer) {
    let mut ctx = RenderContext::new(Box::new(SoftwareDevice::new(width, height).unwrap()));
    let config = RendererConfig {
        shader_root: shader_root(),
        ..RendererConfig::with_resolution(width, height)
    };
    let renderer = DeferredShadingRenderer::new(&mut ctx, PerspectiveCamera::default(), config)
        .expect("renderer should initialize with the shipped shaders");
    (ctx, renderer)
}

/// A white quad three units in front of the camera, lit head-on.
struct LitQuad {
    graph: SceneGraph,
    root: NodeId,
    sun: NodeId,
}

impl LitQuad {
    fn new(ctx: &mut RenderContext) -> Self {
        let mesh = ctx.upload_mesh(mesh::quad()).unwrap();
        let mut graph = SceneGraph::new();
        let root = graph.spawn("root", NodePayload::Empty, Mat4::IDENTITY);
        let quad = graph.spawn(
            "quad",
            NodePayload::Geometry {
                mesh,
                material: Material::default(),
            },
            Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0)),
        );
        let sun = graph.spawn(
            "sun",
            NodePayload::DirectionalLight(DirectionalLight::default()),
            Mat4::IDENTITY,
        );
        graph.add_child(root, quad).unwrap();
        graph.add_child(root, sun).unwrap();
        graph.update_transforms(root);
        Self { graph, root, sun }
    }
}

fn center(texels: &[Vec4], size: u32) -> Vec4 {
    texels[((size / 2) * size + size / 2) as usize]
}

fn read_attachment(
    ctx: &RenderContext,
    renderer: &DeferredShadingRenderer,
    name: &str,
    level: u32,
) -> Vec<Vec4> {
    let targets = renderer.targets();
    let surface = [
        &targets.geometry,
        &targets.light,
        &targets.final_irradiance,
        &targets.post_process,
        &targets.final_pass_through,
    ]
    .into_iter()
    .find_map(|target| target.attachment(name))
    .unwrap();
    ctx.device().read_texture(surface.id(), level, 0).unwrap()
}

#[test]
fn test_lit_quad_reaches_the_display() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    let stats = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    assert_eq!(stats.renderables, 1);
    assert_eq!(stats.directional_lights, 1);
    assert!(!stats.sky_box);

    let color = center(&read_attachment(&ctx, &renderer, "color_buffer", 0), SIZE);
    assert!(color.truncate().max_element() > 0.0, "{color:?}");

    let shown = center(&ctx.device().read_surface(), SIZE);
    assert!(shown.truncate().max_element() > 0.0, "{shown:?}");

    // Corners see no geometry and no sky.
    let corner = read_attachment(&ctx, &renderer, "irradiance_buffer", 0)[0];
    assert_eq!(corner.truncate(), Vec3::ZERO);
}

#[test]
fn test_without_sky_box_irradiance_is_copied() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    let irradiance = read_attachment(&ctx, &renderer, "irradiance_buffer", 0);
    let final_irradiance = read_attachment(&ctx, &renderer, "final_irradiance_buffer", 0);
    assert_eq!(irradiance.len(), final_irradiance.len());
    for (light, copy) in irradiance.iter().zip(&final_irradiance) {
        assert_eq!(light.truncate(), copy.truncate());
    }
    assert!(center(&irradiance, SIZE).x > 0.0);
}

#[test]
fn test_frame_runs_every_phase_and_leaves_a_clean_context() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    let first = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();
    let second = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    assert_eq!(first.phases, FramePhase::SEQUENCE.to_vec());
    assert_eq!(first.frame_index, 0);
    assert_eq!(second.frame_index, 1);
    assert_eq!(first.device_errors, 0);
    assert_eq!(renderer.phase(), FramePhase::Idle);
    assert!(renderer.pending().is_empty());
    assert_eq!(ctx.texture_units().in_use(), 0);
    assert!(ctx.active_program().is_none());
    assert!(ctx.bound_target().is_none());
}

#[test]
fn test_lights_do_not_outlive_their_frame() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let mut scene = LitQuad::new(&mut ctx);
    renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();
    let lit = center(&read_attachment(&ctx, &renderer, "irradiance_buffer", 0), SIZE);
    assert!(lit.x > 0.0);

    // --- 2. ACT ---
    assert_eq!(scene.graph.remove_child(scene.root, scene.sun), 1);
    let stats = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    assert_eq!(stats.directional_lights, 0);
    let unlit = center(&read_attachment(&ctx, &renderer, "irradiance_buffer", 0), SIZE);
    assert_eq!(unlit.truncate(), Vec3::ZERO);
}

#[test]
fn test_mip_chains_are_fresh_after_a_frame() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    let device = ctx.device_as::<SoftwareDevice>().unwrap();
    let targets = renderer.targets();
    for (target, name) in [
        (&targets.light, "irradiance_buffer"),
        (&targets.final_irradiance, "final_irradiance_buffer"),
        (&targets.post_process, "bloom_buffer"),
    ] {
        let id = target.attachment(name).unwrap().id();
        assert_eq!(device.has_stale_mips(id), Some(false), "{name}");
    }

    // Regenerating again changes nothing.
    let light = targets.light.attachment("irradiance_buffer").unwrap().id();
    let before = ctx.device().read_texture(light, 1, 0).unwrap();
    targets.light.generate_mipmaps(&mut ctx).unwrap();
    assert_eq!(ctx.device().read_texture(light, 1, 0).unwrap(), before);
}

#[test]
fn test_window_resolution_drives_camera_and_composite() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    renderer.set_window_resolution(1280, 720);
    renderer.set_window_resolution(0, 720);
    renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    assert_relative_eq!(renderer.camera().aspect_ratio(), 1280.0 / 720.0);
    assert_eq!(renderer.window_resolution(), Extent2D::new(1280, 720));
    assert_eq!(ctx.viewport(), Viewport::from_size(1280, 720));
    assert_eq!(ctx.device().surface_size(), Extent2D::new(1280, 720));
    // Framebuffers keep their size.
    assert_eq!(renderer.targets().geometry.width(), SIZE);
    assert_eq!(
        ctx.device_as::<SoftwareDevice>()
            .unwrap()
            .program_uniform("final_pass_through_program", "window_size"),
        Some(UniformValue::IVec2(IVec2::new(1280, 720)))
    );
}

#[test]
fn test_lens_parameters_reach_post_process_in_meters() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    renderer.camera_mut().set_focal_length(50.0);
    renderer.camera_mut().set_focus(2000.0);

    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    let device = ctx.device_as::<SoftwareDevice>().unwrap();
    assert_eq!(
        device.program_uniform("post_process_program", "focal_length"),
        Some(UniformValue::Float(0.05))
    );
    assert_eq!(
        device.program_uniform("post_process_program", "focus"),
        Some(UniformValue::Float(2.0))
    );
}

#[test]
fn test_depth_of_field_follows_the_framebuffer_not_the_window() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    renderer.set_window_resolution(1280, 720);
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    let camera = renderer.camera();
    let expected = inv_focal_ratio_in_pixels(
        Extent2D::new(SIZE, SIZE),
        camera.diagonal(),
        camera.focal_ratio(),
    );
    let device = ctx.device_as::<SoftwareDevice>().unwrap();
    match device.program_uniform("post_process_program", "inv_focal_ratio_in_pixels") {
        Some(UniformValue::Float(value)) => assert_relative_eq!(value, expected, epsilon = 1e-2),
        other => panic!("unexpected inv_focal_ratio_in_pixels {other:?}"),
    }
    let bloom = &renderer.targets().post_process;
    assert_eq!(
        device.program_uniform("post_process_program", "bloom_buffer_base_size"),
        Some(UniformValue::IVec2(IVec2::new(
            bloom.width() as i32,
            bloom.height() as i32
        )))
    );
}

#[test]
fn test_failed_frame_is_abandoned_and_the_next_one_renders() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let scene = LitQuad::new(&mut ctx);
    // A target left bound makes the geometry pass fail to bind its own.
    renderer.targets().light.bind(&mut ctx).unwrap();

    // --- 2. ACT ---
    let failed = renderer.render(&mut ctx, &scene.graph.subtree(scene.root));

    // --- 3. ASSERT ---
    assert!(matches!(failed, Err(RenderError::InvalidState(_))));
    assert_eq!(renderer.phase(), FramePhase::Idle);
    assert!(renderer.pending().is_empty());
    assert_eq!(ctx.bound_target(), None);
    assert_eq!(ctx.texture_units().in_use(), 0);
    assert_eq!(renderer.frame_index(), 0);

    let stats = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();
    assert_eq!(stats.frame_index, 0);
    assert_eq!(stats.directional_lights, 1);
    assert_eq!(renderer.frame_index(), 1);
}

#[test]
fn test_resized_framebuffers_render_at_the_new_size() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    renderer.resize_framebuffers(&mut ctx, 64, 32).unwrap();
    let stats = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    let targets = renderer.targets();
    assert_eq!((targets.geometry.width(), targets.geometry.height()), (64, 32));
    assert_eq!(
        (targets.final_pass_through.width(), targets.final_pass_through.height()),
        (64, 32)
    );
    assert_eq!((targets.post_process.width(), targets.post_process.height()), (32, 16));
    assert_eq!(stats.device_errors, 0);

    let color = read_attachment(&ctx, &renderer, "color_buffer", 0);
    assert_eq!(color.len(), 64 * 32);
    let lit = color[(16 * 64 + 32) as usize];
    assert!(lit.truncate().max_element() > 0.0, "{lit:?}");
    // The window keeps its size.
    assert_eq!(ctx.device().surface_size(), Extent2D::new(SIZE, SIZE));
}

#[test]
fn test_submitted_sky_box_overrides_for_one_frame() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let sky = gradient_sky_box(
        &mut ctx,
        8,
        LinearRgba::rgb(0.8, 0.9, 1.0),
        LinearRgba::rgb(0.1, 0.3, 0.9),
    )
    .unwrap();
    let mut scene = LitQuad::new(&mut ctx);
    let sky_node = scene.graph.spawn(
        "sky",
        NodePayload::SkyBox(SkyBox {
            cube_map: sky.id(),
            intensity: 1.0,
        }),
        Mat4::IDENTITY,
    );
    scene.graph.add_child(scene.root, sky_node).unwrap();

    // --- 2. ACT ---
    let with_sky = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();
    scene.graph.remove_child(scene.root, sky_node);
    let without_sky = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    assert!(with_sky.sky_box);
    assert!(!without_sky.sky_box);
    assert!(renderer.sky_box().is_none());
    assert_eq!(with_sky.device_errors, 0);
    assert_eq!(ctx.texture_units().in_use(), 0);
}

#[test]
fn test_sky_box_fills_the_background() {
    // --- 1. ARRANGE ---
    let (mut ctx, mut renderer) = setup(SIZE, SIZE);
    let sky = gradient_sky_box(
        &mut ctx,
        8,
        LinearRgba::rgb(0.8, 0.9, 1.0),
        LinearRgba::rgb(0.1, 0.3, 0.9),
    )
    .unwrap();
    renderer.set_sky_box(Some(SkyBox {
        cube_map: sky.id(),
        intensity: 1.0,
    }));
    let scene = LitQuad::new(&mut ctx);

    // --- 2. ACT ---
    let stats = renderer
        .render(&mut ctx, &scene.graph.subtree(scene.root))
        .unwrap();

    // --- 3. ASSERT ---
    assert!(stats.sky_box);
    let corner = read_attachment(&ctx, &renderer, "irradiance_buffer", 0)[0];
    assert!(corner.truncate().min_element() > 0.0, "{corner:?}");
}

#[test]
fn test_invalid_mesh_upload_yields_none() {
    let (mut ctx, _renderer) = setup(SIZE, SIZE);
    let mut broken = mesh::quad();
    broken.indices.push(42);

    assert!(ctx.upload_mesh(broken).is_none());
}

#[test]
fn test_missing_shaders_fail_initialization() {
    // --- 1. ARRANGE ---
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = RenderContext::new(Box::new(SoftwareDevice::new(SIZE, SIZE).unwrap()));
    let config = RendererConfig {
        shader_root: dir.path().to_path_buf(),
        ..RendererConfig::with_resolution(SIZE, SIZE)
    };

    // --- 2. ACT ---
    let result = DeferredShadingRenderer::new(&mut ctx, PerspectiveCamera::default(), config);

    // --- 3. ASSERT ---
    match result {
        Err(RenderError::ResourceError(ResourceError::Shader(ShaderError::LoadError {
            path,
            ..
        }))) => assert!(path.ends_with(".vert") || path.ends_with(".frag"), "{path}"),
        other => panic!("expected a load error, got {other:?}"),
    }
}

#[test]
fn test_empty_window_is_rejected() {
    let mut ctx = RenderContext::new(Box::new(SoftwareDevice::new(SIZE, SIZE).unwrap()));
    let config = RendererConfig {
        shader_root: shader_root(),
        window_width: 0,
        ..RendererConfig::with_resolution(SIZE, SIZE)
    };

    let result = DeferredShadingRenderer::new(&mut ctx, PerspectiveCamera::default(), config);

    assert!(matches!(result, Err(RenderError::InitializationFailed(_))));
}
