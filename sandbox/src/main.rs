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

// Umbra Sandbox
// Renders a few frames of a lit box under a gradient sky and saves the last
// one as `sandbox_output.png`.

use anyhow::{Context, Result};
use umbra_core::math::{LinearRgba, Mat4, Vec3, PI};
use umbra_core::renderer::{DirectionalLight, Material, PerspectiveCamera, PointLight, SkyBox};
use umbra_data::mesh;
use umbra_data::scene::{NodePayload, SceneGraph};
use umbra_infra::graphics::software::SoftwareDevice;
use umbra_lanes::deferred::{DeferredShadingRenderer, RendererConfig};
use umbra_lanes::sky_box::gradient_sky_box;
use umbra_lanes::RenderContext;

/// The reference resolution is divided by this to keep the CPU device fast.
const SANDBOX_SCALE: u32 = 4;
const FRAMES: u32 = 8;
const FRAME_TIME: f32 = 1.0 / FRAMES as f32;
/// Radians per second of the lamp orbit.
const LAMP_SPEED: f32 = PI;
const OUTPUT: &str = "sandbox_output.png";

fn config() -> Result<RendererConfig> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => RendererConfig::load(&path)
            .with_context(|| format!("Failed to load renderer config '{path}'"))?,
        None => RendererConfig::default(),
    };
    config.framebuffer_width /= SANDBOX_SCALE;
    config.framebuffer_height /= SANDBOX_SCALE;
    config.window_width /= SANDBOX_SCALE;
    config.window_height /= SANDBOX_SCALE;
    Ok(config)
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config()?;
    let window = (config.window_width, config.window_height);
    let device = SoftwareDevice::new(window.0, window.1)?;
    let mut ctx = RenderContext::new(Box::new(device));
    let mut renderer =
        DeferredShadingRenderer::new(&mut ctx, PerspectiveCamera::default(), config)?;

    let sky = gradient_sky_box(
        &mut ctx,
        32,
        LinearRgba::rgb(0.85, 0.9, 1.0),
        LinearRgba::rgb(0.15, 0.35, 0.85),
    )?;
    renderer.set_sky_box(Some(SkyBox {
        cube_map: sky.id(),
        intensity: 0.6,
    }));

    // --- Scene ---
    let box_mesh = ctx
        .upload_mesh(mesh::box_mesh(Vec3::splat(-0.5), Vec3::splat(0.5)))
        .context("Box mesh was rejected by the device")?;
    let floor_mesh = ctx
        .upload_mesh(mesh::quad())
        .context("Floor mesh was rejected by the device")?;

    let mut scene = SceneGraph::new();
    let root = scene.spawn("root", NodePayload::Empty, Mat4::IDENTITY);
    let model = scene.spawn(
        "box",
        NodePayload::Geometry {
            mesh: box_mesh,
            material: Material {
                albedo: LinearRgba::rgb(0.8, 0.3, 0.2),
                roughness: 0.3,
                metalness: 0.0,
            },
        },
        Mat4::IDENTITY,
    );
    let floor = scene.spawn(
        "floor",
        NodePayload::Geometry {
            mesh: floor_mesh,
            material: Material {
                albedo: LinearRgba::rgb(0.6, 0.6, 0.6),
                roughness: 0.15,
                metalness: 0.8,
            },
        },
        Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0))
            * Mat4::from_rotation_x(-PI * 0.5)
            * Mat4::from_scale(Vec3::splat(3.0)),
    );
    let lamp = scene.spawn(
        "lamp",
        NodePayload::PointLight(PointLight::new(LinearRgba::rgb(1.0, 0.8, 0.6), 1.5)),
        Mat4::from_translation(Vec3::new(1.0, 1.0, 0.0)),
    );
    let sun = scene.spawn(
        "sun",
        NodePayload::DirectionalLight(DirectionalLight {
            color: LinearRgba::rgb(1.0, 0.8, 0.7),
            intensity: 0.15,
        }),
        Mat4::from_axis_angle(Vec3::new(-1.0, 0.0, -1.0).normalize(), PI * 0.15),
    );
    for child in [model, floor, lamp, sun] {
        scene.add_child(root, child)?;
    }

    // --- Frames ---
    for frame in 0..FRAMES {
        let angle = frame as f32 / FRAMES as f32 * PI * 0.5;
        let eye = Vec3::new(3.5 * angle.sin(), 1.5, 3.5 * angle.cos());
        renderer.camera_mut().look_at(eye, Vec3::ZERO, Vec3::Y);
        let dt = if frame == 0 { 0.0 } else { FRAME_TIME };
        scene.update(root, dt, |id, node, dt| {
            if id == lamp {
                let orbit = Mat4::from_rotation_y(LAMP_SPEED * dt);
                node.set_relative_transform(orbit * node.relative_transform());
            }
        });

        let stats = renderer.render(&mut ctx, &scene.subtree(root))?;
        log::info!(
            "Sandbox: frame {} took {:?} ({} device errors)",
            stats.frame_index,
            stats.cpu_time,
            stats.device_errors
        );
    }

    save_surface(&ctx, window)?;
    renderer.destroy(&mut ctx)?;
    Ok(())
}

/// Writes the display surface to [`OUTPUT`], flipping its bottom-up rows.
fn save_surface(ctx: &RenderContext, (width, height): (u32, u32)) -> Result<()> {
    let texels = ctx.device().read_surface();
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        let texel = texels[((height - 1 - y) * width + x) as usize];
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgba([
            channel(texel.x),
            channel(texel.y),
            channel(texel.z),
            channel(texel.w),
        ])
    });
    image
        .save(OUTPUT)
        .with_context(|| format!("Failed to write {OUTPUT}"))?;
    log::info!("Sandbox: saved {width}x{height} frame to {OUTPUT}");
    Ok(())
}
