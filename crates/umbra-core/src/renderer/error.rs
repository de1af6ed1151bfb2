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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::{ProgramId, ShaderStage};
use std::fmt;

/// An error related to loading or compiling a shader program.
#[derive(Debug)]
pub enum ShaderError {
    /// An error occurred while trying to load the shader source from a path.
    LoadError {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying I/O or source error.
        source_error: String,
    },
    /// The shader source failed to compile into a backend-specific program.
    CompilationError {
        /// A descriptive label for the program.
        label: String,
        /// Detailed error messages from the shader compiler.
        details: String,
    },
    /// A stage every program needs was not provided.
    MissingStage {
        /// A descriptive label for the program.
        label: String,
        /// The stage that was missing.
        stage: ShaderStage,
    },
    /// The requested program could not be found.
    NotFound {
        /// The ID of the program that was not found.
        id: ProgramId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LoadError { path, source_error } => {
                write!(
                    f,
                    "Failed to load shader source from '{path}': {source_error}"
                )
            }
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::MissingStage { label, stage } => {
                write!(f, "Shader program '{label}' is missing its {stage:?} stage")
            }
            ShaderError::NotFound { id } => {
                write!(f, "Shader program not found for ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a GPU resource (textures,
/// framebuffers, meshes, programs).
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// A framebuffer failed its completeness check.
    FramebufferIncomplete(String),
    /// A texture format combination is inconsistent or unsupported.
    InvalidFormat(String),
    /// Geometry handed to the device is malformed.
    InvalidMeshData(String),
    /// An attempt was made to access a resource out of its bounds.
    OutOfBounds,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::FramebufferIncomplete(msg) => {
                write!(f, "Framebuffer is incomplete: {msg}")
            }
            ResourceError::InvalidFormat(msg) => write!(f, "Invalid texture format: {msg}"),
            ResourceError::InvalidMeshData(msg) => write!(f, "Invalid mesh data: {msg}"),
            ResourceError::OutOfBounds => {
                write!(f, "Resource access out of bounds.")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

/// A high-level error raised by the renderer or the render context.
#[derive(Debug)]
pub enum RenderError {
    /// A failure occurred while building programs or render targets.
    InitializationFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// A logic error in pass sequencing: nested program activation, double
    /// binds, unbalanced texture units or passes out of order.
    InvalidState(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize renderer: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::InvalidState(msg) => {
                write!(f, "Invalid render state: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::ResourceError(ResourceError::Shader(err))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn shader_error_display() {
        let err = ShaderError::LoadError {
            path: "shaders/geometry_pass.vert".to_string(),
            source_error: "File not found".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Failed to load shader source from 'shaders/geometry_pass.vert': File not found"
        );

        let err_stage = ShaderError::MissingStage {
            label: "gbuffer_program".to_string(),
            stage: ShaderStage::Fragment,
        };
        assert_eq!(
            format!("{err_stage}"),
            "Shader program 'gbuffer_program' is missing its Fragment stage"
        );
    }

    #[test]
    fn render_error_wraps_shader_error_chain() {
        let render_err: RenderError = ShaderError::NotFound { id: ProgramId(7) }.into();
        assert_eq!(
            format!("{render_err}"),
            "Graphics resource operation failed: Shader resource error: Shader program not found for ID: ProgramId(7)"
        );
        assert!(render_err.source().is_some());
        assert!(render_err.source().unwrap().source().is_some());
    }

    #[test]
    fn invalid_state_has_no_source() {
        let err = RenderError::InvalidState("nested program".to_string());
        assert!(err.source().is_none());
        assert_eq!(format!("{err}"), "Invalid render state: nested program");
    }
}
