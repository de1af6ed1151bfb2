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

use crate::render_lane::{RenderContext, ShaderProgram};
use std::path::Path;
use umbra_core::renderer::RenderError;

/// Every program a frame uses. Screen-space programs share the
/// `shading_pass.vert` full-screen vertex stage.
#[derive(Debug)]
pub struct DeferredPrograms {
    pub(super) gbuffer: ShaderProgram,
    pub(super) point_lights: ShaderProgram,
    pub(super) directional_lights: ShaderProgram,
    pub(super) environment_diffuse: ShaderProgram,
    pub(super) cube_map: ShaderProgram,
    pub(super) reflection: ShaderProgram,
    pub(super) irradiance: ShaderProgram,
    pub(super) output_highlights: ShaderProgram,
    pub(super) post_process: ShaderProgram,
    pub(super) final_pass_through: ShaderProgram,
}

impl DeferredPrograms {
    /// Loads every program from `root`.
    ///
    /// # Errors
    ///
    /// The first program that fails to load or link aborts the load.
    pub fn load(ctx: &mut RenderContext, root: &Path) -> Result<Self, RenderError> {
        let mut screen = |label: &str, fragment: &str| {
            ShaderProgram::from_files(
                ctx,
                label,
                root.join("shading_pass.vert"),
                root.join(format!("{fragment}.frag")),
            )
        };
        let point_lights = screen("shading_program_point_lights", "shading_pass_point_light")?;
        let directional_lights = screen(
            "shading_program_directional_lights",
            "shading_pass_directional_light",
        )?;
        let environment_diffuse = screen(
            "shading_program_environment_diffuse",
            "shading_pass_environment_diffuse",
        )?;
        let reflection = screen("shading_program_reflection", "shading_pass_reflection")?;
        let irradiance = screen("shading_program_irradiance", "shading_pass_irradiance")?;
        let output_highlights = screen(
            "output_highlights_program",
            "shading_pass_output_highlights",
        )?;
        let post_process = screen("post_process_program", "shading_pass_post_process")?;
        let final_pass_through = screen("final_pass_through_program", "final_pass_through")?;

        let gbuffer = ShaderProgram::from_files(
            ctx,
            "gbuffer_program",
            root.join("geometry_pass.vert"),
            root.join("geometry_pass.frag"),
        )?;
        let cube_map = ShaderProgram::from_files(
            ctx,
            "cube_map_program",
            root.join("cube_map.vert"),
            root.join("cube_map.frag"),
        )?;

        log::info!("DeferredPrograms: loaded 10 programs from '{}'", root.display());
        Ok(Self {
            gbuffer,
            point_lights,
            directional_lights,
            environment_diffuse,
            cube_map,
            reflection,
            irradiance,
            output_highlights,
            post_process,
            final_pass_through,
        })
    }

    /// Releases every program.
    pub fn destroy(self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        for program in [
            self.gbuffer,
            self.point_lights,
            self.directional_lights,
            self.environment_diffuse,
            self.cube_map,
            self.reflection,
            self.irradiance,
            self.output_highlights,
            self.post_process,
            self.final_pass_through,
        ] {
            program.destroy(ctx)?;
        }
        Ok(())
    }
}
