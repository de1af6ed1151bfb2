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

//! The off-screen targets of the deferred pipeline.
//!
//! | Target               | Attachments                                            |
//! |----------------------|--------------------------------------------------------|
//! | `geometry`           | `albedo_buffer` RGBA8, `position_buffer`, `normal_buffer`, `material_buffer` RGB16F, depth |
//! | `light`              | `irradiance_buffer` RGBA16F, mip-mapped                |
//! | `final_irradiance`   | `final_irradiance_buffer` RGB16F, mip-mapped           |
//! | `post_process`       | `bloom_buffer` RGB16F, mip-mapped, reduced resolution  |
//! | `final_pass_through` | `color_buffer` RGB8                                    |

use super::config::RendererConfig;
use crate::render_lane::{RenderContext, RenderTarget, RenderTexture, UseDepthBuffer};
use umbra_core::renderer::{FilterMode, FormatDescriptor, RenderError};

/// Every render target a frame writes, owned by the renderer.
#[derive(Debug)]
pub struct DeferredTargets {
    /// The geometry buffer.
    pub geometry: RenderTarget,
    /// Accumulated direct and environment lighting.
    pub light: RenderTarget,
    /// Lighting with reflections.
    pub final_irradiance: RenderTarget,
    /// Highlights feeding the bloom.
    pub post_process: RenderTarget,
    /// The post-processed image, drawn to the display surface last.
    pub final_pass_through: RenderTarget,
}

impl DeferredTargets {
    /// Creates every target at the framebuffer size of `config`.
    pub fn new(ctx: &mut RenderContext, config: &RendererConfig) -> Result<Self, RenderError> {
        let (width, height) = (config.framebuffer_width, config.framebuffer_height);
        let (bloom_width, bloom_height) = config.bloom_size();

        let geometry = RenderTarget::new(
            ctx,
            "geometry",
            width,
            height,
            vec![
                RenderTexture::new("albedo_buffer", FormatDescriptor::RGBA8, FilterMode::Nearest),
                RenderTexture::new(
                    "position_buffer",
                    FormatDescriptor::RGB16F,
                    FilterMode::Nearest,
                ),
                RenderTexture::new("normal_buffer", FormatDescriptor::RGB16F, FilterMode::Nearest),
                RenderTexture::new(
                    "material_buffer",
                    FormatDescriptor::RGB16F,
                    FilterMode::Nearest,
                ),
            ],
            UseDepthBuffer::Yes,
        )?;
        let light = RenderTarget::new(
            ctx,
            "light",
            width,
            height,
            vec![RenderTexture::new(
                "irradiance_buffer",
                FormatDescriptor::RGBA16F,
                FilterMode::LinearMipMap,
            )],
            UseDepthBuffer::No,
        )?;
        let final_irradiance = RenderTarget::new(
            ctx,
            "final_irradiance",
            width,
            height,
            vec![RenderTexture::new(
                "final_irradiance_buffer",
                FormatDescriptor::RGB16F,
                FilterMode::LinearMipMap,
            )],
            UseDepthBuffer::No,
        )?;
        let post_process = RenderTarget::new(
            ctx,
            "post_process",
            bloom_width,
            bloom_height,
            vec![RenderTexture::new(
                "bloom_buffer",
                FormatDescriptor::RGB16F,
                FilterMode::LinearMipMap,
            )],
            UseDepthBuffer::No,
        )?;
        let final_pass_through = RenderTarget::new(
            ctx,
            "final_pass_through",
            width,
            height,
            vec![RenderTexture::new(
                "color_buffer",
                FormatDescriptor::RGB8,
                FilterMode::Linear,
            )],
            UseDepthBuffer::No,
        )?;

        Ok(Self {
            geometry,
            light,
            final_irradiance,
            post_process,
            final_pass_through,
        })
    }

    /// Releases every target.
    pub fn destroy(self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        self.geometry.destroy(ctx)?;
        self.light.destroy(ctx)?;
        self.final_irradiance.destroy(ctx)?;
        self.post_process.destroy(ctx)?;
        self.final_pass_through.destroy(ctx)
    }
}
