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

//! A CPU implementation of [`GraphicsDevice`](umbra_core::renderer::GraphicsDevice).
//!
//! The device keeps GL's coordinate conventions (bottom-left origin, clip
//! depth in `[-1, 1]` mapped to a `[0, 1]` depth buffer) so that the
//! renderer above it does not need to know which backend it drives. Shader
//! programs are resolved to Rust kernels through the file stems of their
//! stages, see [`kernels`].

mod device;
mod format;
pub mod kernels;
mod program;
mod raster;
mod texture;

pub use self::device::{DeviceStats, SoftwareDevice};
pub use self::format::{decode_texel, quantize};
