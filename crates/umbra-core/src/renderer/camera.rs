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

//! The perspective camera and its physical lens description.
//!
//! Besides the projection, the camera describes a thin lens (focal length,
//! focus distance, f-number and sensor size). Lens values are stored in
//! millimeters, the unit photographers use; the depth-of-field pass converts
//! them to meters.

use crate::math::{degrees_to_radians, Mat4, Vec3};

/// Diagonal of a full-frame 36x24 mm sensor.
pub const FULL_FRAME_SENSOR_DIAGONAL_MM: f32 = 43.266_617;

/// A perspective camera placed in the world by an absolute transform.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    fov_y: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    focal_length_mm: f32,
    focus_mm: f32,
    focal_ratio: f32,
    sensor_diagonal_mm: f32,
    world_transform: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov_y: degrees_to_radians(45.0),
            aspect_ratio: 1.0,
            near: 0.1,
            far: 100.0,
            focal_length_mm: 50.0,
            focus_mm: 2000.0,
            focal_ratio: 2.8,
            sensor_diagonal_mm: FULL_FRAME_SENSOR_DIAGONAL_MM,
            world_transform: Mat4::IDENTITY,
        }
    }
}

impl PerspectiveCamera {
    /// Creates a camera with the given vertical field of view (radians),
    /// aspect ratio and clip distances. Lens parameters take their defaults.
    pub fn new(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y,
            aspect_ratio,
            near,
            far,
            ..Default::default()
        }
    }

    /// The projection matrix, right-handed with GL `[-1, 1]` clip depth.
    pub fn projection_transform(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    /// The view matrix, the inverse of the absolute transform.
    pub fn view_transform(&self) -> Mat4 {
        self.world_transform.inverse()
    }

    /// The camera's placement in the world.
    pub fn absolute_transform(&self) -> Mat4 {
        self.world_transform
    }

    /// Places the camera in the world.
    pub fn set_absolute_transform(&mut self, transform: Mat4) {
        self.world_transform = transform;
    }

    /// Places the camera at `eye` looking towards `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.world_transform = Mat4::look_at_rh(eye, target, up).inverse();
    }

    /// Width over height of the image.
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Sets the aspect ratio. Non-finite or non-positive values are ignored.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        } else {
            log::warn!("Ignoring invalid camera aspect ratio {aspect_ratio}");
        }
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Sets the vertical field of view in radians.
    pub fn set_fov_y(&mut self, fov_y: f32) {
        self.fov_y = fov_y;
    }

    /// Near clip distance.
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clip distance.
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Focal length in millimeters.
    pub fn focal_length(&self) -> f32 {
        self.focal_length_mm
    }

    /// Sets the focal length in millimeters.
    pub fn set_focal_length(&mut self, millimeters: f32) {
        self.focal_length_mm = millimeters;
    }

    /// Focus distance in millimeters.
    pub fn focus(&self) -> f32 {
        self.focus_mm
    }

    /// Sets the focus distance in millimeters.
    pub fn set_focus(&mut self, millimeters: f32) {
        self.focus_mm = millimeters;
    }

    /// The f-number of the lens.
    pub fn focal_ratio(&self) -> f32 {
        self.focal_ratio
    }

    /// Sets the f-number of the lens.
    pub fn set_focal_ratio(&mut self, focal_ratio: f32) {
        self.focal_ratio = focal_ratio;
    }

    /// Sensor diagonal in millimeters.
    pub fn diagonal(&self) -> f32 {
        self.sensor_diagonal_mm
    }

    /// Sets the sensor diagonal in millimeters.
    pub fn set_diagonal(&mut self, millimeters: f32) {
        self.sensor_diagonal_mm = millimeters;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    #[test]
    fn test_view_is_inverse_of_placement() {
        let mut camera = PerspectiveCamera::default();
        camera.look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        let eye_in_view = camera.view_transform() * Vec4::new(0.0, 0.0, 3.0, 1.0);
        assert_relative_eq!(eye_in_view.truncate().length(), 0.0, epsilon = 1e-5);
        let origin_in_view = camera.view_transform() * Vec4::W;
        assert_relative_eq!(origin_in_view.z, -3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_projection_maps_near_plane_to_minus_one() {
        let camera = PerspectiveCamera::new(1.0, 1.0, 0.5, 10.0);
        let clip = camera.projection_transform() * Vec4::new(0.0, 0.0, -0.5, 1.0);
        assert_relative_eq!(clip.z / clip.w, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_aspect_ratio_is_ignored() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect_ratio(1280.0 / 720.0);
        camera.set_aspect_ratio(0.0);
        camera.set_aspect_ratio(f32::NAN);
        assert_eq!(camera.aspect_ratio(), 1280.0 / 720.0);
    }
}
