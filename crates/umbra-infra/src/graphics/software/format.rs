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

//! Texel encoding and storage precision.

use half::f16;
use umbra_core::math::Vec4;
use umbra_core::renderer::{ComponentType, FormatDescriptor, TextureFormat};

/// Rounds `color` to the precision of `storage` and expands it back to RGBA.
///
/// Channels the storage does not have read back as 0, except alpha which
/// reads back as 1.
pub fn quantize(storage: TextureFormat, color: Vec4) -> Vec4 {
    let component = storage.storage_component();
    let mut out = Vec4::new(0.0, 0.0, 0.0, 1.0);
    for channel in 0..storage.layout().channel_count() {
        out[channel] = quantize_component(component, color[channel]);
    }
    out
}

fn quantize_component(component: ComponentType, value: f32) -> f32 {
    match component {
        ComponentType::UnsignedByte => (value.clamp(0.0, 1.0) * 255.0).round() / 255.0,
        ComponentType::HalfFloat => f16::from_f32(value).to_f32(),
        ComponentType::Float => value,
    }
}

/// Decodes one uploaded texel. `bytes` holds `format.bytes_per_pixel()`
/// bytes laid out with the format's upload component type.
pub fn decode_texel(format: &FormatDescriptor, bytes: &[u8]) -> Vec4 {
    let size = format.component.size_in_bytes();
    let mut out = Vec4::new(0.0, 0.0, 0.0, 1.0);
    for (channel, chunk) in bytes
        .chunks_exact(size)
        .take(format.layout.channel_count())
        .enumerate()
    {
        out[channel] = match format.component {
            ComponentType::UnsignedByte => chunk[0] as f32 / 255.0,
            ComponentType::HalfFloat => f16::from_le_bytes([chunk[0], chunk[1]]).to_f32(),
            ComponentType::Float => bytemuck::pod_read_unaligned::<f32>(chunk),
        };
    }
    quantize(format.storage, out)
}
