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

//! Program loading and kernel binding.

use super::kernels::{self, FragmentKernel, UniformBlock, VertexKernel};
use std::path::Path;
use umbra_core::renderer::{ShaderError, ShaderProgramDescriptor, ShaderStage};

/// Every stage source must define an entry point.
const ENTRY_POINT: &str = "void main";

/// A linked program: the kernels selected by its stage files and the
/// uniform values set on it so far.
#[derive(Debug)]
pub(crate) struct SoftProgram {
    pub label: String,
    pub vertex: &'static dyn VertexKernel,
    pub fragment: &'static dyn FragmentKernel,
    pub uniforms: UniformBlock,
}

impl SoftProgram {
    /// Reads every stage of `descriptor` from disk and binds the vertex and
    /// fragment kernels named by the stage file stems.
    pub fn compile(descriptor: &ShaderProgramDescriptor) -> Result<Self, ShaderError> {
        let label = descriptor.label.clone();
        let missing = |stage| ShaderError::MissingStage {
            label: label.clone(),
            stage,
        };
        let vertex_path = descriptor
            .vertex
            .as_deref()
            .ok_or_else(|| missing(ShaderStage::Vertex))?;
        let fragment_path = descriptor
            .fragment
            .as_deref()
            .ok_or_else(|| missing(ShaderStage::Fragment))?;

        for (stage, path) in descriptor.stages() {
            let Some(path) = path else { continue };
            let source = std::fs::read_to_string(path).map_err(|err| ShaderError::LoadError {
                path: path.display().to_string(),
                source_error: err.to_string(),
            })?;
            if !source.contains(ENTRY_POINT) {
                return Err(ShaderError::CompilationError {
                    label,
                    details: format!("{stage:?} stage '{}' has no entry point", path.display()),
                });
            }
            if !matches!(stage, ShaderStage::Vertex | ShaderStage::Fragment) {
                return Err(ShaderError::CompilationError {
                    label,
                    details: format!("{stage:?} stages are not supported by the software device"),
                });
            }
        }

        let vertex = kernels::vertex_kernel(stem(vertex_path)).ok_or_else(|| {
            ShaderError::CompilationError {
                label: label.clone(),
                details: format!("no vertex kernel for '{}'", vertex_path.display()),
            }
        })?;
        let fragment = kernels::fragment_kernel(stem(fragment_path)).ok_or_else(|| {
            ShaderError::CompilationError {
                label: label.clone(),
                details: format!("no fragment kernel for '{}'", fragment_path.display()),
            }
        })?;

        Ok(Self {
            label,
            vertex,
            fragment,
            uniforms: UniformBlock::default(),
        })
    }
}

fn stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_stage_stems_select_kernels() {
        let dir = tempfile::tempdir().unwrap();
        let vertex = write(dir.path(), "shading_pass.vert", "void main() {}");
        let fragment = write(dir.path(), "shading_pass_irradiance.frag", "void main() {}");

        let program =
            SoftProgram::compile(&ShaderProgramDescriptor::new("irradiance", vertex, fragment))
                .unwrap();

        assert_eq!(program.label, "irradiance");
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let vertex = write(dir.path(), "shading_pass.vert", "void main() {}");
        let fragment = dir.path().join("shading_pass_point_light.frag");

        let result = SoftProgram::compile(&ShaderProgramDescriptor::new("point", vertex, &fragment));

        match result {
            Err(ShaderError::LoadError { path, .. }) => {
                assert_eq!(path, fragment.display().to_string())
            }
            other => panic!("expected a load error, got {other:?}"),
        }
    }

    #[test]
    fn test_source_without_entry_point_fails_to_compile() {
        let dir = tempfile::tempdir().unwrap();
        let vertex = write(dir.path(), "shading_pass.vert", "void main() {}");
        let fragment = write(dir.path(), "final_pass_through.frag", "// empty");

        let result = SoftProgram::compile(&ShaderProgramDescriptor::new("final", vertex, fragment));

        assert!(matches!(result, Err(ShaderError::CompilationError { .. })));
    }

    #[test]
    fn test_unknown_kernel_fails_to_compile() {
        let dir = tempfile::tempdir().unwrap();
        let vertex = write(dir.path(), "shading_pass.vert", "void main() {}");
        let fragment = write(dir.path(), "toon.frag", "void main() {}");

        let result = SoftProgram::compile(&ShaderProgramDescriptor::new("toon", vertex, fragment));

        assert!(matches!(result, Err(ShaderError::CompilationError { .. })));
    }

    #[test]
    fn test_missing_fragment_stage() {
        let descriptor = ShaderProgramDescriptor {
            label: "half".to_string(),
            vertex: Some(PathBuf::from("shading_pass.vert")),
            ..Default::default()
        };
        assert!(matches!(
            SoftProgram::compile(&descriptor),
            Err(ShaderError::MissingStage {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
    }
}
