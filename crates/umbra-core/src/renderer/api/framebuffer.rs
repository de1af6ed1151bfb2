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

//! Off-screen render target descriptors.

use crate::math::Extent2D;
use crate::renderer::api::texture::TextureId;

/// A handle to a framebuffer owned by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub usize);

/// Describes a framebuffer to create.
///
/// The position of a texture in `color_attachments` is its attachment slot,
/// i.e. the fragment output location that writes to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDescriptor {
    /// A debug label.
    pub label: String,
    /// Dimensions every attachment must share.
    pub size: Extent2D,
    /// Color attachments, slot 0 first.
    pub color_attachments: Vec<TextureId>,
    /// Whether the framebuffer owns a depth buffer.
    pub depth: bool,
}
