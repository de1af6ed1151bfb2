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

//! # Umbra Lanes
//!
//! The rendering strategy layer. A lane drives a [`GraphicsDevice`] through
//! a [`RenderContext`](render_lane::RenderContext): it owns the render
//! targets and programs it needs, collects the per-frame submissions of the
//! scene and runs its passes in a fixed order.
//!
//! [`GraphicsDevice`]: umbra_core::renderer::GraphicsDevice

pub mod render_lane;

pub use self::render_lane::*;
