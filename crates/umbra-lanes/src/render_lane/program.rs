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

use super::context::RenderContext;
use std::path::PathBuf;
use umbra_core::renderer::{ProgramId, RenderError, ShaderProgramDescriptor};

/// A linked program living on the device.
///
/// Programs are only made active through
/// [`RenderContext::use_program`], which scopes their use.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    label: String,
}

impl ShaderProgram {
    /// Loads and links every stage named by `descriptor`.
    ///
    /// # Errors
    ///
    /// A missing vertex or fragment stage, an unreadable stage file or a
    /// stage that fails to compile is fatal and returned as is.
    pub fn new(
        ctx: &mut RenderContext,
        descriptor: &ShaderProgramDescriptor,
    ) -> Result<Self, RenderError> {
        let id = ctx.device_mut().create_program(descriptor).map_err(|err| {
            log::error!("ShaderProgram: '{}' failed: {err}", descriptor.label);
            err
        })?;
        log::debug!("ShaderProgram: '{}' linked as {id:?}", descriptor.label);
        Ok(Self {
            id,
            label: descriptor.label.clone(),
        })
    }

    /// A vertex + fragment program.
    pub fn from_files(
        ctx: &mut RenderContext,
        label: &str,
        vertex: impl Into<PathBuf>,
        fragment: impl Into<PathBuf>,
    ) -> Result<Self, RenderError> {
        Self::new(ctx, &ShaderProgramDescriptor::new(label, vertex, fragment))
    }

    /// Diagnostic name of the program.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Device handle of the program.
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Releases the program on the device.
    pub fn destroy(self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.device_mut().destroy_program(self.id)?;
        Ok(())
    }
}
