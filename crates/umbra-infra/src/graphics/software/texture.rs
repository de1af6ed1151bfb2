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

//! Texture storage, mip chains and sampling.

use super::format::quantize;
use umbra_core::math::{IVec2, Vec2, Vec3, Vec4};
use umbra_core::renderer::{
    cube_face_uv, FilterMode, ResourceError, TextureDescriptor, TextureDimension, WrappingMode,
};

#[derive(Debug, Clone)]
struct MipLevel {
    width: u32,
    height: u32,
    layers: Vec<Vec<Vec4>>,
}

impl MipLevel {
    fn new(width: u32, height: u32, layer_count: u32, fill: Vec4) -> Self {
        let texels = vec![fill; width as usize * height as usize];
        Self {
            width,
            height,
            layers: vec![texels; layer_count as usize],
        }
    }

    fn texel(&self, layer: usize, x: u32, y: u32) -> Vec4 {
        self.layers[layer][(y * self.width + x) as usize]
    }
}

/// A texture with its full mip chain, every texel stored at the precision
/// of its storage format.
///
/// Levels `1..` are only refreshed by [`generate_mipmaps`](Self::generate_mipmaps);
/// any write to level 0 leaves them stale.
#[derive(Debug, Clone)]
pub(crate) struct SoftTexture {
    descriptor: TextureDescriptor,
    levels: Vec<MipLevel>,
    stale_mips: bool,
}

impl SoftTexture {
    pub fn new(descriptor: &TextureDescriptor) -> Result<Self, ResourceError> {
        let size = descriptor.size;
        if size.width == 0 || size.height == 0 || size.depth_or_array_layers == 0 {
            return Err(ResourceError::InvalidFormat(format!(
                "texture '{}' has an empty extent {size:?}",
                descriptor.label
            )));
        }
        match descriptor.dimension {
            TextureDimension::D2 if size.depth_or_array_layers != 1 => {
                return Err(ResourceError::InvalidFormat(format!(
                    "2D texture '{}' must have exactly one layer",
                    descriptor.label
                )));
            }
            TextureDimension::Cube
                if size.width != size.height || size.depth_or_array_layers != 6 =>
            {
                return Err(ResourceError::InvalidFormat(format!(
                    "cube map '{}' needs six square faces, got {size:?}",
                    descriptor.label
                )));
            }
            _ => {}
        }

        let fill = quantize(descriptor.format.storage, Vec4::ZERO);
        let levels = (0..descriptor.mip_level_count())
            .map(|level| {
                MipLevel::new(
                    (size.width >> level).max(1),
                    (size.height >> level).max(1),
                    size.depth_or_array_layers,
                    fill,
                )
            })
            .collect();

        Ok(Self {
            descriptor: descriptor.clone(),
            levels,
            stale_mips: false,
        })
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn max_lod(&self) -> f32 {
        (self.levels.len() - 1) as f32
    }

    pub fn has_stale_mips(&self) -> bool {
        self.stale_mips
    }

    fn touch(&mut self) {
        self.stale_mips = self.levels.len() > 1;
    }

    /// Replaces one layer of level 0.
    pub fn write_layer(&mut self, layer: u32, texels: &[Vec4]) -> Result<(), ResourceError> {
        let storage = self.descriptor.format.storage;
        let target = self.levels[0]
            .layers
            .get_mut(layer as usize)
            .ok_or(ResourceError::OutOfBounds)?;
        if texels.len() != target.len() {
            return Err(ResourceError::InvalidFormat(format!(
                "expected {} texels, got {}",
                target.len(),
                texels.len()
            )));
        }
        for (dst, src) in target.iter_mut().zip(texels) {
            *dst = quantize(storage, *src);
        }
        self.touch();
        Ok(())
    }

    pub fn read(&self, level: u32, layer: u32) -> Option<&[Vec4]> {
        self.levels
            .get(level as usize)?
            .layers
            .get(layer as usize)
            .map(Vec::as_slice)
    }

    /// Reads a texel of level 0, layer 0.
    pub fn load(&self, x: u32, y: u32) -> Vec4 {
        self.levels[0].texel(0, x, y)
    }

    /// Writes a texel of level 0, layer 0.
    pub fn store(&mut self, x: u32, y: u32, color: Vec4) {
        let width = self.levels[0].width;
        self.levels[0].layers[0][(y * width + x) as usize] =
            quantize(self.descriptor.format.storage, color);
        self.touch();
    }

    /// Fills every layer of level 0 with `color`.
    pub fn clear(&mut self, color: Vec4) {
        let value = quantize(self.descriptor.format.storage, color);
        for layer in &mut self.levels[0].layers {
            layer.fill(value);
        }
        self.touch();
    }

    /// Rebuilds levels `1..` from level 0 with a 2x2 box filter.
    pub fn generate_mipmaps(&mut self) {
        let storage = self.descriptor.format.storage;
        for level in 1..self.levels.len() {
            let (done, rest) = self.levels.split_at_mut(level);
            let src = &done[level - 1];
            let dst = &mut rest[0];
            for (layer, texels) in dst.layers.iter_mut().enumerate() {
                for y in 0..dst.height {
                    for x in 0..dst.width {
                        let x0 = (x * 2).min(src.width - 1);
                        let y0 = (y * 2).min(src.height - 1);
                        let x1 = (x0 + 1).min(src.width - 1);
                        let y1 = (y0 + 1).min(src.height - 1);
                        let sum = src.texel(layer, x0, y0)
                            + src.texel(layer, x1, y0)
                            + src.texel(layer, x0, y1)
                            + src.texel(layer, x1, y1);
                        texels[(y * dst.width + x) as usize] = quantize(storage, sum * 0.25);
                    }
                }
            }
        }
        self.stale_mips = false;
    }

    /// Samples layer 0 at normalized coordinates `uv`, using the texture's
    /// filter and wrap modes. `lod` only matters for mipmapped textures.
    pub fn sample(&self, uv: Vec2, lod: f32) -> Vec4 {
        self.sample_layer(0, uv, lod, self.descriptor.wrap)
    }

    /// Samples a cube map in `direction`. Faces are not filtered across
    /// their seams.
    pub fn sample_cube(&self, direction: Vec3, lod: f32) -> Vec4 {
        match cube_face_uv(direction) {
            Some((face, uv)) => self.sample_layer(face as usize, uv, lod, WrappingMode::ClampToEdge),
            None => Vec4::ZERO,
        }
    }

    /// Unfiltered read of an integer texel of layer 0. Out of range reads
    /// return zero.
    pub fn texel_fetch(&self, coord: IVec2, level: u32) -> Vec4 {
        let Some(mip) = self.levels.get(level as usize) else {
            return Vec4::ZERO;
        };
        if coord.x < 0 || coord.y < 0 || coord.x >= mip.width as i32 || coord.y >= mip.height as i32
        {
            return Vec4::ZERO;
        }
        mip.texel(0, coord.x as u32, coord.y as u32)
    }

    fn sample_layer(&self, layer: usize, uv: Vec2, lod: f32, wrap: WrappingMode) -> Vec4 {
        match self.descriptor.filter {
            FilterMode::Nearest => self.nearest(0, layer, uv, wrap),
            FilterMode::Linear => self.bilinear(0, layer, uv, wrap),
            FilterMode::LinearMipMap => {
                let lod = if lod.is_nan() {
                    0.0
                } else {
                    lod.clamp(0.0, self.max_lod())
                };
                let base = lod.floor() as usize;
                let blend = lod - base as f32;
                let low = self.bilinear(base, layer, uv, wrap);
                if blend <= 0.0 || base + 1 >= self.levels.len() {
                    low
                } else {
                    low.lerp(self.bilinear(base + 1, layer, uv, wrap), blend)
                }
            }
        }
    }

    fn nearest(&self, level: usize, layer: usize, uv: Vec2, wrap: WrappingMode) -> Vec4 {
        let mip = &self.levels[level];
        let x = wrap_coord((uv.x * mip.width as f32).floor() as i32, mip.width, wrap);
        let y = wrap_coord((uv.y * mip.height as f32).floor() as i32, mip.height, wrap);
        mip.texel(layer, x, y)
    }

    fn bilinear(&self, level: usize, layer: usize, uv: Vec2, wrap: WrappingMode) -> Vec4 {
        let mip = &self.levels[level];
        let fx = uv.x * mip.width as f32 - 0.5;
        let fy = uv.y * mip.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let xa = wrap_coord(x0, mip.width, wrap);
        let xb = wrap_coord(x0 + 1, mip.width, wrap);
        let ya = wrap_coord(y0, mip.height, wrap);
        let yb = wrap_coord(y0 + 1, mip.height, wrap);

        let bottom = mip.texel(layer, xa, ya).lerp(mip.texel(layer, xb, ya), tx);
        let top = mip.texel(layer, xa, yb).lerp(mip.texel(layer, xb, yb), tx);
        bottom.lerp(top, ty)
    }
}

fn wrap_coord(i: i32, size: u32, mode: WrappingMode) -> u32 {
    let n = size as i32;
    let wrapped = match mode {
        WrappingMode::ClampToEdge => i.clamp(0, n - 1),
        WrappingMode::Repeat => i.rem_euclid(n),
        WrappingMode::MirroredRepeat => {
            let m = i.rem_euclid(2 * n);
            if m >= n {
                2 * n - 1 - m
            } else {
                m
            }
        }
    };
    wrapped as u32
}
