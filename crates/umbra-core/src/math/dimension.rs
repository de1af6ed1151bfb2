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

//! Integer extents for textures, framebuffers and windows.

/// A two-dimensional extent, typically representing width and height.
///
/// This is commonly used for framebuffer dimensions or window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by the extent.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length of the pixel diagonal, `sqrt(width^2 + height^2)`.
    pub fn diagonal(&self) -> f32 {
        (self.width as f32).hypot(self.height as f32)
    }

    /// Returns `true` when either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A three-dimensional extent, representing width, height, and depth.
///
/// This is used for 2D textures (`depth_or_array_layers == 1`) and cube maps
/// (`depth_or_array_layers == 6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
    /// The depth or number of array layers.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32, depth_or_array_layers: u32) -> Self {
        Self {
            width,
            height,
            depth_or_array_layers,
        }
    }

    /// The 2D footprint of a single layer.
    pub fn layer_extent(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }

    /// Number of mip levels of a full chain down to 1x1.
    pub fn max_mip_levels(&self) -> u32 {
        let largest = self.width.max(self.height).max(1);
        32 - largest.leading_zeros()
    }
}

impl From<Extent2D> for Extent3D {
    fn from(extent: Extent2D) -> Self {
        Self::new(extent.width, extent.height, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_mip_levels() {
        assert_eq!(Extent3D::new(1, 1, 1).max_mip_levels(), 1);
        assert_eq!(Extent3D::new(256, 256, 1).max_mip_levels(), 9);
        assert_eq!(Extent3D::new(1440, 960, 1).max_mip_levels(), 11);
    }

    #[test]
    fn test_diagonal_is_pythagorean() {
        assert_eq!(Extent2D::new(3, 4).diagonal(), 5.0);
    }
}
