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

use image::DynamicImage;
use std::path::Path;
use umbra_core::math::Extent3D;
use umbra_core::renderer::{CpuTexture, FormatDescriptor};

/// Converts a decoded image to an RGBA8 texture.
///
/// Image rows are stored top-down while textures are bottom-up, so the
/// image is flipped on the way.
pub fn cpu_texture_from_image(image: &DynamicImage) -> CpuTexture {
    let rgba = image::imageops::flip_vertical(&image.to_rgba8());
    CpuTexture {
        size: Extent3D::new(rgba.width(), rgba.height(), 1),
        format: FormatDescriptor::RGBA8,
        pixels: rgba.into_raw(),
    }
}

/// Loads an image file as an RGBA8 texture.
///
/// Returns `None` and logs an error if the file is missing or cannot be
/// decoded.
pub fn load_texture(path: impl AsRef<Path>) -> Option<CpuTexture> {
    let path = path.as_ref();
    match image::open(path) {
        Ok(image) => Some(cpu_texture_from_image(&image)),
        Err(err) => {
            log::error!("Failed to load texture '{}': {err}", path.display());
            None
        }
    }
}

/// Loads six square images as the faces of a cube map, ordered
/// +X, -X, +Y, -Y, +Z, -Z.
///
/// Returns `None` and logs an error if any face fails to load or the faces
/// do not share one square size.
pub fn load_cube_map<P: AsRef<Path>>(faces: [P; 6]) -> Option<CpuTexture> {
    let mut pixels = Vec::new();
    let mut face_size = None;
    for face in &faces {
        let texture = load_texture(face)?;
        let size = texture.size.width;
        if texture.size.height != size || face_size.is_some_and(|s| s != size) {
            log::error!(
                "Cube map face '{}' is {}x{}, faces must share one square size",
                face.as_ref().display(),
                texture.size.width,
                texture.size.height
            );
            return None;
        }
        face_size = Some(size);
        pixels.extend_from_slice(&texture.pixels);
    }
    let size = face_size?;
    Some(CpuTexture {
        size: Extent3D::new(size, size, 6),
        format: FormatDescriptor::RGBA8,
        pixels,
    })
}
