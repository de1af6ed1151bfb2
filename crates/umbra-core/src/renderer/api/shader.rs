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

//! Shader program descriptors and uniform values.
//!
//! Programs are opaque to the renderer: they are identified by a label and
//! the source files of their stages, and they receive parameters by name.

use crate::math::{IVec2, Mat3, Mat4, Vec2, Vec3, Vec4};
use std::path::PathBuf;

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex stage (required).
    Vertex,
    /// The tessellation control stage.
    TessellationControl,
    /// The tessellation evaluation stage.
    TessellationEvaluation,
    /// The geometry stage.
    Geometry,
    /// The fragment stage (required).
    Fragment,
}

/// A handle to a linked program owned by a [`GraphicsDevice`](crate::renderer::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub usize);

/// The source files a program is built from.
///
/// `vertex` and `fragment` must be present; the other stages are optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderProgramDescriptor {
    /// Diagnostic name of the program.
    pub label: String,
    /// Vertex stage source file.
    pub vertex: Option<PathBuf>,
    /// Tessellation control stage source file.
    pub tessellation_control: Option<PathBuf>,
    /// Tessellation evaluation stage source file.
    pub tessellation_evaluation: Option<PathBuf>,
    /// Geometry stage source file.
    pub geometry: Option<PathBuf>,
    /// Fragment stage source file.
    pub fragment: Option<PathBuf>,
}

impl ShaderProgramDescriptor {
    /// A vertex + fragment program.
    pub fn new(
        label: impl Into<String>,
        vertex: impl Into<PathBuf>,
        fragment: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label: label.into(),
            vertex: Some(vertex.into()),
            fragment: Some(fragment.into()),
            ..Default::default()
        }
    }

    /// Every stage with its optional path, in pipeline order.
    pub fn stages(&self) -> [(ShaderStage, Option<&PathBuf>); 5] {
        [
            (ShaderStage::Vertex, self.vertex.as_ref()),
            (
                ShaderStage::TessellationControl,
                self.tessellation_control.as_ref(),
            ),
            (
                ShaderStage::TessellationEvaluation,
                self.tessellation_evaluation.as_ref(),
            ),
            (ShaderStage::Geometry, self.geometry.as_ref()),
            (ShaderStage::Fragment, self.fragment.as_ref()),
        ]
    }
}

/// A value bound to a named program parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// A signed integer, also used for sampler units.
    Int(i32),
    /// A float.
    Float(f32),
    /// An integer pair (sizes in pixels).
    IVec2(IVec2),
    /// A 2-component vector.
    Vec2(Vec2),
    /// A 3-component vector.
    Vec3(Vec3),
    /// A 4-component vector.
    Vec4(Vec4),
    /// A 3x3 matrix.
    Mat3(Mat3),
    /// A 4x4 matrix.
    Mat4(Mat4),
}
