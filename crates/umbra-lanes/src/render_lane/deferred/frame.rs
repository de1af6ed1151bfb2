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

use std::time::Duration;

/// The steps of a frame, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    /// Between frames.
    Idle,
    /// The scene pushes its renderables and lights into the pending lists.
    Submission,
    /// Renderables are rasterized into the geometry buffer.
    GeometryPass,
    /// Lights, and the sky box when there is one, accumulate into the light
    /// buffer.
    LightAccumulation,
    /// The light buffer mip chain is rebuilt.
    LightMipmaps,
    /// Reflections are added on top of the light buffer, or it is copied.
    Reflection,
    /// The final irradiance mip chain is rebuilt.
    ReflectionMipmaps,
    /// Bright regions are extracted into the half-resolution bloom buffer.
    HighlightExtraction,
    /// The bloom buffer mip chain is rebuilt.
    BloomMipmaps,
    /// Depth of field, bloom and tone mapping.
    PostProcess,
    /// The post-processed image is drawn to the display surface.
    FinalComposite,
    /// Errors recorded by the device are drained and logged.
    ErrorCheck,
}

impl FramePhase {
    /// Every phase of a frame, in order.
    pub const SEQUENCE: [FramePhase; 11] = [
        FramePhase::Submission,
        FramePhase::GeometryPass,
        FramePhase::LightAccumulation,
        FramePhase::LightMipmaps,
        FramePhase::Reflection,
        FramePhase::ReflectionMipmaps,
        FramePhase::HighlightExtraction,
        FramePhase::BloomMipmaps,
        FramePhase::PostProcess,
        FramePhase::FinalComposite,
        FramePhase::ErrorCheck,
    ];

    /// The phase allowed to follow this one.
    pub fn next(self) -> FramePhase {
        match self {
            FramePhase::Idle => FramePhase::Submission,
            FramePhase::Submission => FramePhase::GeometryPass,
            FramePhase::GeometryPass => FramePhase::LightAccumulation,
            FramePhase::LightAccumulation => FramePhase::LightMipmaps,
            FramePhase::LightMipmaps => FramePhase::Reflection,
            FramePhase::Reflection => FramePhase::ReflectionMipmaps,
            FramePhase::ReflectionMipmaps => FramePhase::HighlightExtraction,
            FramePhase::HighlightExtraction => FramePhase::BloomMipmaps,
            FramePhase::BloomMipmaps => FramePhase::PostProcess,
            FramePhase::PostProcess => FramePhase::FinalComposite,
            FramePhase::FinalComposite => FramePhase::ErrorCheck,
            FramePhase::ErrorCheck => FramePhase::Idle,
        }
    }
}

/// What one call to `render` did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Index of the frame, starting at 0.
    pub frame_index: u64,
    /// Phases executed, in order.
    pub phases: Vec<FramePhase>,
    /// Renderables drawn by the geometry pass.
    pub renderables: usize,
    /// Point lights accumulated.
    pub point_lights: usize,
    /// Directional lights accumulated.
    pub directional_lights: usize,
    /// Whether a sky box contributed to the frame.
    pub sky_box: bool,
    /// Errors the device recorded during the frame.
    pub device_errors: usize,
    /// CPU time spent in `render`.
    pub cpu_time: Duration,
}
