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

//! Backend-agnostic rendering API.
//!
//! - **[`texture`]**: output surfaces, their formats and sampling modes.
//! - **[`framebuffer`]**: render target descriptors and handles.
//! - **[`shader`]**: program descriptors and uniform values.
//! - **[`mesh`]**: value-typed geometry handed to the device.
//! - **[`state`]**: fixed-function state (viewport, blending, clears).
//! - **[`adapter`]**: information about the device backing a context.

pub mod adapter;
pub mod framebuffer;
pub mod mesh;
pub mod shader;
pub mod state;
pub mod texture;

pub use self::adapter::{GraphicsAdapterInfo, GraphicsBackendType, RendererDeviceType};
pub use self::framebuffer::{FramebufferDescriptor, FramebufferId};
pub use self::mesh::{MeshData, MeshId, PrimitiveTopology};
pub use self::shader::{ProgramId, ShaderProgramDescriptor, ShaderStage, UniformValue};
pub use self::state::{BlendMode, ClearFlags, Viewport};
pub use self::texture::{
    cube_face_direction, cube_face_uv, ChannelLayout, ComponentType, CpuTexture, FilterMode,
    FormatDescriptor, TextureDescriptor, TextureDimension, TextureFormat, TextureId, WrappingMode,
};
