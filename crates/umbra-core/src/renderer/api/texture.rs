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

//! Defines data structures related to texture (output surface) resources.

use crate::math::{Extent3D, Vec2, Vec3};
use crate::renderer::error::ResourceError;

/// The logical channel layout of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// A single red channel.
    R,
    /// Red and green channels.
    Rg,
    /// Red, green and blue channels.
    Rgb,
    /// Red, green, blue and alpha channels.
    Rgba,
    /// A single depth value.
    Depth,
}

impl ChannelLayout {
    /// Number of components per texel.
    pub fn channel_count(&self) -> usize {
        match self {
            ChannelLayout::R | ChannelLayout::Depth => 1,
            ChannelLayout::Rg => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// The data type of each component of the texels handed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Normalized 8-bit unsigned integers.
    UnsignedByte,
    /// IEEE 754 half-precision floats.
    HalfFloat,
    /// IEEE 754 single-precision floats.
    Float,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            ComponentType::UnsignedByte => 1,
            ComponentType::HalfFloat => 2,
            ComponentType::Float => 4,
        }
    }
}

/// The internal storage format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One 8-bit normalized channel.
    R8Unorm,
    /// Three 8-bit normalized channels.
    Rgb8Unorm,
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
    /// One half-float channel.
    R16Float,
    /// Three half-float channels.
    Rgb16Float,
    /// Four half-float channels.
    Rgba16Float,
    /// One 32-bit float channel.
    R32Float,
    /// Three 32-bit float channels.
    Rgb32Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// 32-bit float depth.
    Depth32Float,
}

impl TextureFormat {
    /// The channel layout this storage format holds.
    pub fn layout(&self) -> ChannelLayout {
        match self {
            TextureFormat::R8Unorm | TextureFormat::R16Float | TextureFormat::R32Float => {
                ChannelLayout::R
            }
            TextureFormat::Rgb8Unorm | TextureFormat::Rgb16Float | TextureFormat::Rgb32Float => {
                ChannelLayout::Rgb
            }
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba16Float
            | TextureFormat::Rgba32Float => ChannelLayout::Rgba,
            TextureFormat::Depth32Float => ChannelLayout::Depth,
        }
    }

    /// The precision each channel is stored with.
    pub fn storage_component(&self) -> ComponentType {
        match self {
            TextureFormat::R8Unorm | TextureFormat::Rgb8Unorm | TextureFormat::Rgba8Unorm => {
                ComponentType::UnsignedByte
            }
            TextureFormat::R16Float | TextureFormat::Rgb16Float | TextureFormat::Rgba16Float => {
                ComponentType::HalfFloat
            }
            TextureFormat::R32Float
            | TextureFormat::Rgb32Float
            | TextureFormat::Rgba32Float
            | TextureFormat::Depth32Float => ComponentType::Float,
        }
    }

    /// Whether this format can be used as a color attachment.
    pub fn is_color(&self) -> bool {
        !matches!(self, TextureFormat::Depth32Float)
    }
}

/// The full format triple of an output surface: logical layout, internal
/// storage and the component type of uploaded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatDescriptor {
    /// The logical channel layout.
    pub layout: ChannelLayout,
    /// The internal storage format.
    pub storage: TextureFormat,
    /// The component type of texel data written to the texture.
    pub component: ComponentType,
}

impl FormatDescriptor {
    /// 8-bit RGBA, the albedo buffer format.
    pub const RGBA8: Self = Self {
        layout: ChannelLayout::Rgba,
        storage: TextureFormat::Rgba8Unorm,
        component: ComponentType::UnsignedByte,
    };
    /// 8-bit RGB, the final color format.
    pub const RGB8: Self = Self {
        layout: ChannelLayout::Rgb,
        storage: TextureFormat::Rgb8Unorm,
        component: ComponentType::UnsignedByte,
    };
    /// Half-float RGB, used by the position, normal, material, irradiance
    /// and bloom buffers.
    pub const RGB16F: Self = Self {
        layout: ChannelLayout::Rgb,
        storage: TextureFormat::Rgb16Float,
        component: ComponentType::HalfFloat,
    };
    /// Half-float RGBA, the light accumulation format.
    pub const RGBA16F: Self = Self {
        layout: ChannelLayout::Rgba,
        storage: TextureFormat::Rgba16Float,
        component: ComponentType::HalfFloat,
    };
    /// Full-float RGB.
    pub const RGB32F: Self = Self {
        layout: ChannelLayout::Rgb,
        storage: TextureFormat::Rgb32Float,
        component: ComponentType::Float,
    };

    /// Builds a descriptor, rejecting a layout that does not match the
    /// storage format.
    pub fn new(
        layout: ChannelLayout,
        storage: TextureFormat,
        component: ComponentType,
    ) -> Result<Self, ResourceError> {
        if storage.layout() != layout {
            return Err(ResourceError::InvalidFormat(format!(
                "layout {layout:?} does not match storage {storage:?}"
            )));
        }
        if layout == ChannelLayout::Depth && component != ComponentType::Float {
            return Err(ResourceError::InvalidFormat(format!(
                "depth textures take float data, got {component:?}"
            )));
        }
        Ok(Self {
            layout,
            storage,
            component,
        })
    }

    /// Size of one uploaded texel in bytes.
    pub fn bytes_per_pixel(&self) -> usize {
        self.layout.channel_count() * self.component.size_in_bytes()
    }
}

/// Texture filtering used when the surface is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Point sampling of the base level.
    Nearest,
    /// Bilinear sampling of the base level.
    Linear,
    /// Trilinear sampling across a full mip chain. The chain must be
    /// regenerated after every write that a later pass samples.
    LinearMipMap,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrappingMode {
    /// Coordinates are clamped to the edge texel.
    ClampToEdge,
    /// Coordinates wrap around.
    Repeat,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirroredRepeat,
}

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A single 2D image.
    D2,
    /// Six square 2D faces, ordered +X, -X, +Y, -Y, +Z, -Z.
    Cube,
}

/// A handle to a texture owned by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// A descriptor used to create a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// A debug label, also used as the sampler name of render attachments.
    pub label: String,
    /// The dimensions (width, height, layers) of the texture.
    pub size: Extent3D,
    /// The dimensionality of the texture.
    pub dimension: TextureDimension,
    /// The format triple.
    pub format: FormatDescriptor,
    /// The sampling filter.
    pub filter: FilterMode,
    /// The wrapping mode on every axis.
    pub wrap: WrappingMode,
}

impl TextureDescriptor {
    /// A single-layer 2D texture.
    pub fn new_2d(
        label: impl Into<String>,
        width: u32,
        height: u32,
        format: FormatDescriptor,
        filter: FilterMode,
        wrap: WrappingMode,
    ) -> Self {
        Self {
            label: label.into(),
            size: Extent3D::new(width, height, 1),
            dimension: TextureDimension::D2,
            format,
            filter,
            wrap,
        }
    }

    /// A cube map with square faces of `face_size` texels.
    pub fn cube(
        label: impl Into<String>,
        face_size: u32,
        format: FormatDescriptor,
        filter: FilterMode,
    ) -> Self {
        Self {
            label: label.into(),
            size: Extent3D::new(face_size, face_size, 6),
            dimension: TextureDimension::Cube,
            format,
            filter,
            wrap: WrappingMode::ClampToEdge,
        }
    }

    /// Number of mip levels the texture carries.
    pub fn mip_level_count(&self) -> u32 {
        match self.filter {
            FilterMode::LinearMipMap => self.size.max_mip_levels(),
            FilterMode::Nearest | FilterMode::Linear => 1,
        }
    }

    /// Number of bytes one layer of level 0 occupies when uploaded.
    pub fn layer_size_in_bytes(&self) -> usize {
        self.size.width as usize * self.size.height as usize * self.format.bytes_per_pixel()
    }
}

/// Raw image data living in system memory, ready to be uploaded.
///
/// Layers are stored back to back; rows are bottom-up.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    /// Dimensions of the image.
    pub size: Extent3D,
    /// Format of `pixels`.
    pub format: FormatDescriptor,
    /// Texel bytes.
    pub pixels: Vec<u8>,
}

impl CpuTexture {
    /// Wraps `pixels`, checking that their length matches the extent.
    pub fn new(
        size: Extent3D,
        format: FormatDescriptor,
        pixels: Vec<u8>,
    ) -> Result<Self, ResourceError> {
        let expected = size.width as usize
            * size.height as usize
            * size.depth_or_array_layers as usize
            * format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(ResourceError::InvalidFormat(format!(
                "expected {expected} bytes for {size:?}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            size,
            format,
            pixels,
        })
    }

    /// The bytes of a single layer.
    pub fn layer(&self, layer: u32) -> Option<&[u8]> {
        let layer_len =
            self.size.width as usize * self.size.height as usize * self.format.bytes_per_pixel();
        let start = layer as usize * layer_len;
        self.pixels.get(start..start + layer_len)
    }
}

/// Maps a direction to the cube map face it hits and the face coordinates
/// in `[0, 1]`, following the OpenGL face convention.
///
/// Faces are numbered +X, -X, +Y, -Y, +Z, -Z. Returns `None` for the zero
/// vector.
pub fn cube_face_uv(direction: Vec3) -> Option<(u32, Vec2)> {
    let abs = direction.abs();
    let (face, sc, tc, ma) = if abs.x >= abs.y && abs.x >= abs.z {
        if direction.x >= 0.0 {
            (0, -direction.z, -direction.y, abs.x)
        } else {
            (1, direction.z, -direction.y, abs.x)
        }
    } else if abs.y >= abs.z {
        if direction.y >= 0.0 {
            (2, direction.x, direction.z, abs.y)
        } else {
            (3, direction.x, -direction.z, abs.y)
        }
    } else if direction.z >= 0.0 {
        (4, direction.x, -direction.y, abs.z)
    } else {
        (5, -direction.x, -direction.y, abs.z)
    };
    if ma <= 0.0 {
        return None;
    }
    Some((face, Vec2::new(sc / ma + 1.0, tc / ma + 1.0) * 0.5))
}

/// Inverse of [`cube_face_uv`]: the (unnormalized) direction through the
/// face coordinates `uv` of `face`.
pub fn cube_face_direction(face: u32, uv: Vec2) -> Vec3 {
    let s = uv.x * 2.0 - 1.0;
    let t = uv.y * 2.0 - 1.0;
    match face {
        0 => Vec3::new(1.0, -t, -s),
        1 => Vec3::new(-1.0, -t, s),
        2 => Vec3::new(s, 1.0, t),
        3 => Vec3::new(s, -1.0, -t),
        4 => Vec3::new(s, -t, 1.0),
        _ => Vec3::new(-s, -t, -1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rejects_mismatched_layout() {
        let result = FormatDescriptor::new(
            ChannelLayout::Rgba,
            TextureFormat::Rgb16Float,
            ComponentType::HalfFloat,
        );
        assert!(matches!(result, Err(ResourceError::InvalidFormat(_))));
    }

    #[test]
    fn test_format_accepts_byte_upload_into_half_storage() {
        let format = FormatDescriptor::new(
            ChannelLayout::Rgb,
            TextureFormat::Rgb16Float,
            ComponentType::UnsignedByte,
        )
        .unwrap();
        assert_eq!(format.bytes_per_pixel(), 3);
    }

    #[test]
    fn test_mip_level_count_follows_filter() {
        let mipped = TextureDescriptor::new_2d(
            "irradiance_buffer",
            256,
            128,
            FormatDescriptor::RGBA16F,
            FilterMode::LinearMipMap,
            WrappingMode::ClampToEdge,
        );
        assert_eq!(mipped.mip_level_count(), 9);

        let flat = TextureDescriptor {
            filter: FilterMode::Nearest,
            ..mipped
        };
        assert_eq!(flat.mip_level_count(), 1);
    }

    #[test]
    fn test_cpu_texture_checks_length() {
        let size = Extent3D::new(2, 2, 1);
        assert!(CpuTexture::new(size, FormatDescriptor::RGBA8, vec![0; 16]).is_ok());
        assert!(CpuTexture::new(size, FormatDescriptor::RGBA8, vec![0; 15]).is_err());
    }

    #[test]
    fn test_cpu_texture_layer_slices() {
        let size = Extent3D::new(1, 1, 6);
        let pixels: Vec<u8> = (0..24).collect();
        let texture = CpuTexture::new(size, FormatDescriptor::RGBA8, pixels).unwrap();
        assert_eq!(texture.layer(2), Some(&[8u8, 9, 10, 11][..]));
        assert_eq!(texture.layer(6), None);
    }

    #[test]
    fn test_cube_face_selection() {
        assert_eq!(cube_face_uv(Vec3::X).map(|(f, _)| f), Some(0));
        assert_eq!(cube_face_uv(-Vec3::Y).map(|(f, _)| f), Some(3));
        assert_eq!(cube_face_uv(-Vec3::Z).map(|(f, _)| f), Some(5));
        assert_eq!(cube_face_uv(Vec3::ZERO), None);
    }

    #[test]
    fn test_cube_face_direction_inverts_face_uv() {
        let uv = Vec2::new(0.25, 0.8);
        for face in 0..6 {
            let direction = cube_face_direction(face, uv);
            let (back_face, back_uv) = cube_face_uv(direction).unwrap();
            assert_eq!(back_face, face);
            assert!((back_uv - uv).length() < 1e-5);
        }
    }
}
