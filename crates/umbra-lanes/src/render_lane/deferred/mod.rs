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

//! Deferred shading renderer.
//!
//! This module implements a deferred shading strategy: geometry attributes
//! are rasterized once into a geometry buffer, then every light shades the
//! buffer in screen space. The lighting cost no longer grows with the
//! number of meshes a light touches.
//!
//! # Architecture
//!
//! A frame is a fixed sequence of passes, each reading the targets written
//! by the ones before it (see [`FramePhase`]):
//!
//! 1. **Submission**: the scene pushes renderables and lights into the
//!    [`PendingRenders`] of the renderer.
//! 2. **Geometry pass**: albedo, view-space position, normal and material
//!    go to the geometry buffer, depth tested.
//! 3. **Light accumulation**: every light, then the environment diffuse term
//!    and the sky box, are blended additively into the light buffer.
//! 4. **Reflection**: screen-space reflections with a cube map fallback, or
//!    a plain copy when there is no sky box.
//! 5. **Highlights and post-process**: bloom, depth of field, tone mapping.
//! 6. **Final composite** onto the display surface.
//!
//! Mip chains of the light, final irradiance and bloom buffers are rebuilt
//! between the passes that write and sample them.
//!
//! Submissions are transient: every pending list is drained by the pass
//! consuming it, so a light that is not submitted again next frame
//! contributes nothing.

mod config;
mod frame;
mod lens;
mod passes;
mod programs;
mod targets;

pub use self::config::{ConfigError, RendererConfig, DEFAULT_SHADER_ROOT};
pub use self::frame::{FramePhase, FrameStats};
pub use self::lens::{inv_focal_ratio_in_pixels, millimeters_to_meters, DepthOfFieldUniforms};
pub use self::programs::DeferredPrograms;
pub use self::targets::DeferredTargets;

use super::{DirectionalLightSource, PointLightSource, RenderContext};
use std::time::Instant;
use umbra_core::math::{Extent2D, Mat4};
use umbra_core::renderer::{
    DirectionalLight, PerspectiveCamera, PointLight, RenderError, RenderQueue, Renderable,
    SkyBox, Submit,
};

/// Everything submitted for the frame being built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingRenders {
    /// Opaque geometry.
    pub renderables: Vec<Renderable>,
    /// Point lights.
    pub point_lights: Vec<PointLightSource>,
    /// Directional lights.
    pub directional_lights: Vec<DirectionalLightSource>,
    /// A sky box overriding the configured one for this frame.
    pub sky_box: Option<SkyBox>,
}

impl PendingRenders {
    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
            && self.point_lights.is_empty()
            && self.directional_lights.is_empty()
            && self.sky_box.is_none()
    }

    /// Drops every pending submission.
    pub fn clear(&mut self) {
        self.renderables.clear();
        self.point_lights.clear();
        self.directional_lights.clear();
        self.sky_box = None;
    }
}

/// A rendering lane that implements deferred shading with reflections,
/// bloom and depth of field.
///
/// The renderer owns its render targets, its programs and the pending
/// lists. The device and the bind state live in the [`RenderContext`]
/// handed to every call.
#[derive(Debug)]
pub struct DeferredShadingRenderer {
    config: RendererConfig,
    camera: PerspectiveCamera,
    targets: DeferredTargets,
    programs: DeferredPrograms,
    pending: PendingRenders,
    sky_box: Option<SkyBox>,
    phase: FramePhase,
    frame_index: u64,
}

impl DeferredShadingRenderer {
    /// Loads every program and creates every render target.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InitializationFailed`] for an empty
    /// framebuffer or window size. Program and target failures are returned
    /// as they come; none of them is recoverable.
    pub fn new(
        ctx: &mut RenderContext,
        mut camera: PerspectiveCamera,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let framebuffer = Extent2D::new(config.framebuffer_width, config.framebuffer_height);
        let window = Extent2D::new(config.window_width, config.window_height);
        if framebuffer.is_empty() || window.is_empty() {
            return Err(RenderError::InitializationFailed(format!(
                "framebuffer {}x{} and window {}x{} must not be empty",
                framebuffer.width, framebuffer.height, window.width, window.height
            )));
        }

        let programs = DeferredPrograms::load(ctx, &config.shader_root)?;
        let targets = DeferredTargets::new(ctx, &config)?;
        camera.set_aspect_ratio(window.width as f32 / window.height as f32);

        log::info!(
            "DeferredShadingRenderer: framebuffers {}x{}, window {}x{}",
            framebuffer.width,
            framebuffer.height,
            window.width,
            window.height
        );
        Ok(Self {
            config,
            camera,
            targets,
            programs,
            pending: PendingRenders::default(),
            sky_box: None,
            phase: FramePhase::Idle,
            frame_index: 0,
        })
    }

    /// Renders one frame of `scene` to the display surface.
    ///
    /// The scene must have had its transforms updated. On error the frame is
    /// abandoned: pending submissions are dropped and the bind state of the
    /// context is reset.
    pub fn render(
        &mut self,
        ctx: &mut RenderContext,
        scene: &dyn Submit,
    ) -> Result<FrameStats, RenderError> {
        let started = Instant::now();
        let mut stats = FrameStats {
            frame_index: self.frame_index,
            ..Default::default()
        };

        if let Err(err) = self.run_frame(ctx, scene, &mut stats) {
            log::error!(
                "DeferredShadingRenderer: frame {} failed during {:?}: {err}",
                self.frame_index,
                self.phase
            );
            self.phase = FramePhase::Idle;
            self.pending.clear();
            ctx.abandon_frame();
            return Err(err);
        }

        stats.cpu_time = started.elapsed();
        self.frame_index += 1;
        log::debug!(
            "DeferredShadingRenderer: frame {} ({} renderables, {} point, {} directional) in {:?}",
            stats.frame_index,
            stats.renderables,
            stats.point_lights,
            stats.directional_lights,
            stats.cpu_time
        );
        Ok(stats)
    }

    fn run_frame(
        &mut self,
        ctx: &mut RenderContext,
        scene: &dyn Submit,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        self.enter(FramePhase::Submission, stats)?;
        scene.submit(self);

        self.enter(FramePhase::GeometryPass, stats)?;
        let renderables = std::mem::take(&mut self.pending.renderables);
        stats.renderables = renderables.len();
        self.geometry_pass(ctx, &renderables)?;

        self.enter(FramePhase::LightAccumulation, stats)?;
        let point_lights = std::mem::take(&mut self.pending.point_lights);
        let directional_lights = std::mem::take(&mut self.pending.directional_lights);
        let sky_box = self.pending.sky_box.take().or(self.sky_box);
        stats.point_lights = point_lights.len();
        stats.directional_lights = directional_lights.len();
        stats.sky_box = sky_box.is_some();
        self.light_pass(ctx, &point_lights, &directional_lights, sky_box.as_ref())?;

        self.enter(FramePhase::LightMipmaps, stats)?;
        self.targets.light.generate_mipmaps(ctx)?;

        self.enter(FramePhase::Reflection, stats)?;
        self.reflection_pass(ctx, sky_box.as_ref())?;

        self.enter(FramePhase::ReflectionMipmaps, stats)?;
        self.targets.final_irradiance.generate_mipmaps(ctx)?;

        self.enter(FramePhase::HighlightExtraction, stats)?;
        self.highlight_pass(ctx)?;

        self.enter(FramePhase::BloomMipmaps, stats)?;
        self.targets.post_process.generate_mipmaps(ctx)?;

        self.enter(FramePhase::PostProcess, stats)?;
        self.post_process_pass(ctx)?;

        self.enter(FramePhase::FinalComposite, stats)?;
        self.final_composite(ctx)?;

        self.enter(FramePhase::ErrorCheck, stats)?;
        stats.device_errors = ctx.check_errors();
        self.phase = self.phase.next();
        Ok(())
    }

    /// Moves to `phase`, which must directly follow the current one.
    fn enter(&mut self, phase: FramePhase, stats: &mut FrameStats) -> Result<(), RenderError> {
        let expected = self.phase.next();
        if phase != expected {
            let message = format!(
                "{phase:?} cannot follow {:?}, {expected:?} must run first",
                self.phase
            );
            log::error!("DeferredShadingRenderer: {message}");
            return Err(RenderError::InvalidState(message));
        }
        log::trace!("DeferredShadingRenderer: {phase:?}");
        self.phase = phase;
        stats.phases.push(phase);
        Ok(())
    }

    /// Records a new window size: the camera aspect ratio follows it and the
    /// next final composite covers it. Framebuffers keep their size, see
    /// [`resize_framebuffers`](Self::resize_framebuffers).
    pub fn set_window_resolution(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("DeferredShadingRenderer: ignoring window resolution {width}x{height}");
            return;
        }
        self.config.window_width = width;
        self.config.window_height = height;
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        log::info!("DeferredShadingRenderer: window resolution {width}x{height}");
    }

    /// The size the final composite covers.
    pub fn window_resolution(&self) -> Extent2D {
        Extent2D::new(self.config.window_width, self.config.window_height)
    }

    /// Rebuilds every render target at a new size.
    pub fn resize_framebuffers(
        &mut self,
        ctx: &mut RenderContext,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidState(format!(
                "framebuffers cannot be resized to {width}x{height}"
            )));
        }
        let mut config = self.config.clone();
        config.framebuffer_width = width;
        config.framebuffer_height = height;
        let targets = DeferredTargets::new(ctx, &config)?;
        let previous = std::mem::replace(&mut self.targets, targets);
        self.config = config;
        previous.destroy(ctx)?;
        log::info!("DeferredShadingRenderer: framebuffers resized to {width}x{height}");
        Ok(())
    }

    /// Sets the sky box used when the scene submits none.
    pub fn set_sky_box(&mut self, sky_box: Option<SkyBox>) {
        self.sky_box = sky_box;
    }

    /// The configured sky box.
    pub fn sky_box(&self) -> Option<&SkyBox> {
        self.sky_box.as_ref()
    }

    /// The camera frames are rendered from.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The camera, mutably.
    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    /// Submissions waiting for the next frame.
    pub fn pending(&self) -> &PendingRenders {
        &self.pending
    }

    /// The render targets.
    pub fn targets(&self) -> &DeferredTargets {
        &self.targets
    }

    /// Index of the next frame.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The phase the renderer is in, [`FramePhase::Idle`] between frames.
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// The configuration, with the current sizes.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Releases every target and program.
    pub fn destroy(self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        self.targets.destroy(ctx)?;
        self.programs.destroy(ctx)
    }
}

impl RenderQueue for DeferredShadingRenderer {
    fn submit_renderable(&mut self, renderable: Renderable) {
        self.pending.renderables.push(renderable);
    }

    fn submit_point_light(&mut self, light: PointLight, world_transform: Mat4) {
        self.pending.point_lights.push(PointLightSource {
            light,
            world_transform,
        });
    }

    fn submit_directional_light(&mut self, light: DirectionalLight, world_transform: Mat4) {
        self.pending.directional_lights.push(DirectionalLightSource {
            light,
            world_transform,
        });
    }

    fn submit_sky_box(&mut self, sky_box: SkyBox) {
        if self.pending.sky_box.replace(sky_box).is_some() {
            log::warn!("DeferredShadingRenderer: several sky boxes submitted, keeping the last");
        }
    }
}
