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

//! Fixed-function pipeline state.

/// A rectangle of the bound target that draws are mapped to.
///
/// The origin is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: i32,
    /// Bottom edge in pixels.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// A viewport anchored at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Color blending applied to fragment outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// The fragment replaces the destination.
    #[default]
    Disabled,
    /// `src * 1 + dst * 1`, used to accumulate light contributions.
    Additive,
}

/// Which buffers a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    /// Clear the color attachments.
    pub color: bool,
    /// Clear the depth buffer.
    pub depth: bool,
}

impl ClearFlags {
    /// Color and depth.
    pub const ALL: Self = Self {
        color: true,
        depth: true,
    };
    /// Color only.
    pub const COLOR: Self = Self {
        color: true,
        depth: false,
    };
}
