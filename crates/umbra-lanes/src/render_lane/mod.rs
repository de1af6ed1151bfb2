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

//! Render lanes and the building blocks they share.
//!
//! - **[`RenderContext`]**: the device plus the bind bookkeeping passes rely
//!   on (active program scope, bound target, texture units).
//! - **[`OutputSurface`]** and **[`RenderTarget`]**: textures and the
//!   off-screen targets they are attached to.
//! - **[`ShaderProgram`]**: a linked program loaded from stage files.
//! - **[`LightSource`]**: the per-frame light instances drawn by the light
//!   accumulation pass.
//! - **[`deferred`]**: the deferred shading renderer itself.

mod context;
pub mod deferred;
mod light_source;
mod program;
pub mod sky_box;
mod surface;
mod target;

pub use self::context::{ProgramScope, RenderContext, TextureUnitAllocator};
pub use self::deferred::{
    DeferredShadingRenderer, FramePhase, FrameStats, PendingRenders, RendererConfig,
};
pub use self::light_source::{DirectionalLightSource, LightSource, PointLightSource};
pub use self::program::ShaderProgram;
pub use self::surface::OutputSurface;
pub use self::target::{RenderTarget, RenderTexture, UseDepthBuffer};

#[cfg(test)]
pub(crate) mod test_support {
    use super::RenderContext;
    use std::path::PathBuf;
    use umbra_infra::graphics::software::SoftwareDevice;

    /// A context over a software device with a `width` x `height` surface.
    pub fn context(width: u32, height: u32) -> RenderContext {
        RenderContext::new(Box::new(SoftwareDevice::new(width, height).unwrap()))
    }

    /// The shader assets shipped with the workspace.
    pub fn shader_root() -> PathBuf {
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../assets/shaders/deferred_shading"
        ))
    }
}
