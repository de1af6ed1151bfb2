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

//! Defines light types for the rendering system.
//!
//! Lights carry only their photometric parameters. Position and direction
//! come from the transform of the scene node that holds them, so the same
//! light value can be placed anywhere in the hierarchy.

use crate::math::LinearRgba;
use serde::{Deserialize, Serialize};

/// Attenuated intensity below which a point light is considered to have no
/// visible contribution.
pub const POINT_LIGHT_CUTOFF: f32 = 1.0 / 256.0;

/// A directional light source that illuminates from a uniform direction.
///
/// The light shines along the local `-Z` axis of its node, so rotating the
/// node aims the light.
///
/// # Examples
///
/// ```
/// use umbra_core::renderer::light::DirectionalLight;
/// use umbra_core::math::LinearRgba;
///
/// let sun = DirectionalLight {
///     color: LinearRgba::rgb(1.0, 0.8, 0.7),
///     intensity: 0.15,
/// };
/// assert_eq!(sun.intensity, 0.15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// The color of the light in linear RGB space.
    pub color: LinearRgba,
    /// The intensity multiplier for the light.
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            intensity: 1.0,
        }
    }
}

/// A point light source that emits light in all directions from its node's
/// world position.
///
/// # Examples
///
/// ```
/// use umbra_core::renderer::light::PointLight;
/// use umbra_core::math::LinearRgba;
///
/// let lamp = PointLight::new(LinearRgba::rgb(1.0, 0.8, 0.6), 1.5);
/// assert!(lamp.radius > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// The color of the light in linear RGB space.
    pub color: LinearRgba,
    /// The intensity multiplier of the light.
    pub intensity: f32,
    /// Distance beyond which the light contributes nothing.
    pub radius: f32,
}

impl PointLight {
    /// Creates a point light whose radius is derived from its intensity.
    pub fn new(color: LinearRgba, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            radius: Self::radius_for_intensity(intensity),
        }
    }

    /// Distance at which `intensity / (1 + d^2)` falls to
    /// [`POINT_LIGHT_CUTOFF`].
    pub fn radius_for_intensity(intensity: f32) -> f32 {
        (intensity.max(0.0) / POINT_LIGHT_CUTOFF - 1.0).max(0.0).sqrt()
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(LinearRgba::WHITE, 1.0)
    }
}

/// A light of any supported kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightType {
    /// A point light.
    Point(PointLight),
    /// A directional light.
    Directional(DirectionalLight),
}

impl LightType {
    /// The color of the light regardless of its kind.
    pub fn color(&self) -> LinearRgba {
        match self {
            LightType::Point(light) => light.color,
            LightType::Directional(light) => light.color,
        }
    }

    /// The intensity of the light regardless of its kind.
    pub fn intensity(&self) -> f32 {
        match self {
            LightType::Point(light) => light.intensity,
            LightType::Directional(light) => light.intensity,
        }
    }
}

impl From<PointLight> for LightType {
    fn from(light: PointLight) -> Self {
        LightType::Point(light)
    }
}

impl From<DirectionalLight> for LightType {
    fn from(light: DirectionalLight) -> Self {
        LightType::Directional(light)
    }
}
