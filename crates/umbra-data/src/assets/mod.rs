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

//! Bridges between decoded images and uploadable textures.
//!
//! Decoding itself is delegated to the `image` crate. Failures are asset
//! failures: they are logged and reported as `None`, never as panics.

mod texture;

pub use self::texture::{cpu_texture_from_image, load_cube_map, load_texture};
