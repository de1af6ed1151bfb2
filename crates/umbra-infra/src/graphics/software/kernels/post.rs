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

//! Highlight extraction, post-processing and the final composite.

use super::{window_uv, FragmentContext, FragmentInput, FragmentKernel, FragmentOutput};
use umbra_core::math::color::linear_to_srgb;
use umbra_core::math::{Vec2, Vec3, EPSILON};

/// Brightness above which light bleeds into the bloom buffer.
const HIGHLIGHT_THRESHOLD: f32 = 1.0;

/// View depth used for pixels without geometry.
const BACKGROUND_DEPTH: f32 = 1.0e4;

/// Mip levels of the bloom buffer averaged into the final bloom.
const BLOOM_LEVELS: u32 = 5;

/// `shading_pass_output_highlights.frag`: keeps the part of each pixel that
/// exceeds the threshold, read from the half-blurred final irradiance.
#[derive(Debug)]
pub struct HighlightsFragment;

impl FragmentKernel for HighlightsFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let uv = window_uv(input, context.uniforms());
        let color = context
            .sample("final_irradiance_buffer", uv, 1.0)
            .truncate();
        Some(FragmentOutput::single(highlight(color).extend(1.0)))
    }
}

fn highlight(color: Vec3) -> Vec3 {
    let brightness = color.max_element();
    let weight = (brightness - HIGHLIGHT_THRESHOLD).max(0.0) / brightness.max(EPSILON);
    color * weight
}

/// Diameter of the circle of confusion in pixels for a point at `depth`
/// meters, with a lens of `focal_length` meters focused at `focus` meters.
pub(super) fn circle_of_confusion(
    depth: f32,
    focal_length: f32,
    focus: f32,
    inv_focal_ratio_in_pixels: f32,
) -> f32 {
    if depth <= EPSILON || focus - focal_length <= EPSILON {
        return 0.0;
    }
    focal_length * focal_length * (depth - focus).abs() / (depth * (focus - focal_length))
        * inv_focal_ratio_in_pixels
}

/// `shading_pass_post_process.frag`: depth of field, bloom, tone mapping
/// and sRGB encoding.
#[derive(Debug)]
pub struct PostProcessFragment;

impl FragmentKernel for PostProcessFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let uniforms = context.uniforms();
        let uv = window_uv(input, uniforms);

        let depth = if context.sample("albedo_buffer", uv, 0.0).w > 0.0 {
            -context.sample("position_buffer", uv, 0.0).z
        } else {
            BACKGROUND_DEPTH
        };
        let coc = circle_of_confusion(
            depth,
            uniforms.float("focal_length"),
            uniforms.float("focus"),
            uniforms.float("inv_focal_ratio_in_pixels"),
        );
        let lod = coc.max(1.0).log2();
        let color = context
            .sample("final_irradiance_buffer", uv, lod)
            .truncate();

        let hdr = color + bloom(context, uv);
        let mapped = hdr / (Vec3::ONE + hdr);
        let encoded = Vec3::new(
            linear_to_srgb(mapped.x),
            linear_to_srgb(mapped.y),
            linear_to_srgb(mapped.z),
        );
        Some(FragmentOutput::single(encoded.extend(1.0)))
    }
}

/// Averages four diagonal taps on each of the first bloom mip levels, the
/// tap distance doubling with the level.
fn bloom(context: &FragmentContext<'_>, uv: Vec2) -> Vec3 {
    let texel = Vec2::ONE
        / context
            .uniforms()
            .ivec2("bloom_buffer_base_size")
            .as_vec2()
            .max(Vec2::ONE);
    let mut sum = Vec3::ZERO;
    for level in 0..BLOOM_LEVELS {
        let offset = texel * (1u32 << level) as f32;
        let taps = [
            offset,
            Vec2::new(-offset.x, offset.y),
            Vec2::new(offset.x, -offset.y),
            -offset,
        ];
        let level_sum: Vec3 = taps
            .iter()
            .map(|tap| context.sample("bloom_buffer", uv + *tap, level as f32).truncate())
            .sum();
        sum += level_sum * 0.25;
    }
    sum / BLOOM_LEVELS as f32
}

/// `final_pass_through.frag`: copies the color buffer to the screen.
#[derive(Debug)]
pub struct FinalPassThroughFragment;

impl FragmentKernel for FinalPassThroughFragment {
    fn run(&self, input: &FragmentInput, context: &FragmentContext<'_>) -> Option<FragmentOutput> {
        let uv = window_uv(input, context.uniforms());
        Some(FragmentOutput::single(context.sample("color_buffer", uv, 0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixture::{center_fragment, Fixture};
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::{IVec2, Vec4};
    use umbra_core::renderer::UniformValue;

    #[test]
    fn test_highlights_keep_only_the_excess() {
        assert_eq!(highlight(Vec3::new(0.9, 0.5, 0.1)), Vec3::ZERO);
        assert_relative_eq!(highlight(Vec3::new(4.0, 2.0, 0.0)).x, 3.0);
    }

    #[test]
    fn test_circle_of_confusion_vanishes_at_focus() {
        assert_eq!(circle_of_confusion(2.0, 0.05, 2.0, 1000.0), 0.0);
        // 0.05^2 * 1 / (1 * 1.95) * 1000
        assert_relative_eq!(
            circle_of_confusion(1.0, 0.05, 2.0, 1000.0),
            1.282_051_3,
            epsilon = 1e-5
        );
        assert_eq!(circle_of_confusion(1.0, 0.05, 0.0, 1000.0), 0.0);
    }

    #[test]
    fn test_post_process_tone_maps_into_display_range() {
        // --- 1. ARRANGE ---
        let mut fixture = Fixture::default();
        fixture
            .bind("final_irradiance_buffer", Vec4::new(1.0, 0.0, 30.0, 0.0))
            .bind("bloom_buffer", Vec4::ZERO)
            .bind("albedo_buffer", Vec4::ONE)
            .bind("position_buffer", Vec4::new(0.0, 0.0, -2.0, 1.0))
            .set("window_size", UniformValue::IVec2(IVec2::ONE))
            .set("focal_length", UniformValue::Float(0.05))
            .set("focus", UniformValue::Float(2.0))
            .set("inv_focal_ratio_in_pixels", UniformValue::Float(100.0));

        // --- 2. ACT ---
        let out = PostProcessFragment
            .run(&center_fragment(), &fixture.context())
            .unwrap();

        // --- 3. ASSERT ---
        let color = out.colors[0];
        assert_relative_eq!(color.x, linear_to_srgb(0.5), epsilon = 1e-5);
        assert_eq!(color.y, 0.0);
        assert!(color.z > 0.98 && color.z < 1.0);
        assert!(fixture.diagnostics.borrow().is_empty());
    }

    #[test]
    fn test_final_pass_through_copies_color_buffer() {
        let mut fixture = Fixture::default();
        fixture
            .bind("color_buffer", Vec4::new(0.2, 0.4, 0.6, 1.0))
            .set("window_size", UniformValue::IVec2(IVec2::ONE));

        let out = FinalPassThroughFragment
            .run(&center_fragment(), &fixture.context())
            .unwrap();

        assert_eq!(out.colors[0], Vec4::new(0.2, 0.4, 0.6, 1.0));
    }
}
