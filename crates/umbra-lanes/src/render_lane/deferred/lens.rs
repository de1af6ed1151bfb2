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

//! Thin-lens values fed to the depth of field of the post-process pass.
//!
//! The camera stores its lens in millimeters. The shader works in meters
//! and measures the circle of confusion in pixels, which needs the aperture
//! expressed relative to the sensor: `image_diagonal_px / (sensor_diagonal_m
//! * focal_ratio)`. The image is the framebuffer the blur samples, not the
//! window it is finally shown in.

use crate::render_lane::RenderContext;
use umbra_core::math::Extent2D;
use umbra_core::renderer::{PerspectiveCamera, RenderError, UniformValue};

/// Converts a length in millimeters to meters.
#[inline]
pub fn millimeters_to_meters(millimeters: f32) -> f32 {
    millimeters / 1000.0
}

/// Pixels per meter on the sensor divided by the f-number.
///
/// # Arguments
///
/// * `image`: Size of the image in pixels; its diagonal spans the sensor
///   diagonal.
/// * `sensor_diagonal_mm`: Diagonal of the sensor.
/// * `focal_ratio`: The f-number of the lens.
pub fn inv_focal_ratio_in_pixels(
    image: Extent2D,
    sensor_diagonal_mm: f32,
    focal_ratio: f32,
) -> f32 {
    let denominator = millimeters_to_meters(sensor_diagonal_mm) * focal_ratio;
    if denominator <= 0.0 {
        return 0.0;
    }
    image.diagonal() / denominator
}

/// The depth of field uniforms of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthOfFieldUniforms {
    /// Focal length in meters.
    pub focal_length: f32,
    /// Focus distance in meters.
    pub focus: f32,
    /// See [`inv_focal_ratio_in_pixels`].
    pub inv_focal_ratio_in_pixels: f32,
}

impl DepthOfFieldUniforms {
    /// Derives the uniforms from the camera lens and the size of the image
    /// being blurred.
    pub fn from_camera(camera: &PerspectiveCamera, image: Extent2D) -> Self {
        Self {
            focal_length: millimeters_to_meters(camera.focal_length()),
            focus: millimeters_to_meters(camera.focus()),
            inv_focal_ratio_in_pixels: inv_focal_ratio_in_pixels(
                image,
                camera.diagonal(),
                camera.focal_ratio(),
            ),
        }
    }

    /// Uploads the values to the active program.
    pub fn upload(&self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.set_uniform("focal_length", UniformValue::Float(self.focal_length))?;
        ctx.set_uniform("focus", UniformValue::Float(self.focus))?;
        ctx.set_uniform(
            "inv_focal_ratio_in_pixels",
            UniformValue::Float(self.inv_focal_ratio_in_pixels),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lens_lengths_are_converted_to_meters() {
        let mut camera = PerspectiveCamera::default();
        camera.set_focal_length(50.0);
        camera.set_focus(2000.0);

        let uniforms = DepthOfFieldUniforms::from_camera(&camera, Extent2D::new(256, 256));

        assert_relative_eq!(uniforms.focal_length, 0.05);
        assert_relative_eq!(uniforms.focus, 2.0);
    }

    #[test]
    fn test_inv_focal_ratio_uses_the_pixel_diagonal() {
        // A 3-4-5 image: 500 px of diagonal over a 50 mm sensor at f/2.
        let value = inv_focal_ratio_in_pixels(Extent2D::new(300, 400), 50.0, 2.0);
        assert_relative_eq!(value, 5000.0, epsilon = 1e-2);
    }

    #[test]
    fn test_degenerate_lens_gives_no_blur() {
        assert_eq!(inv_focal_ratio_in_pixels(Extent2D::new(10, 10), 0.0, 2.8), 0.0);
    }
}
