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

//! Construction-time configuration of the deferred renderer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the shader assets live relative to the working directory.
pub const DEFAULT_SHADER_ROOT: &str = "assets/shaders/deferred_shading";

/// Sizes and asset locations of a [`DeferredShadingRenderer`].
///
/// Can be written by hand in RON:
///
/// ```ron
/// (
///     framebuffer_width: 1440,
///     framebuffer_height: 960,
///     window_width: 1440,
///     window_height: 960,
///     shader_root: "assets/shaders/deferred_shading",
///     bloom_divisor: 2,
/// )
/// ```
///
/// [`DeferredShadingRenderer`]: super::DeferredShadingRenderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Width of the off-screen targets in pixels.
    pub framebuffer_width: u32,
    /// Height of the off-screen targets in pixels.
    pub framebuffer_height: u32,
    /// Width of the display surface in pixels.
    pub window_width: u32,
    /// Height of the display surface in pixels.
    pub window_height: u32,
    /// Directory holding the stage files of every program.
    pub shader_root: PathBuf,
    /// The bloom buffer is this many times smaller than the framebuffers on
    /// each axis.
    pub bloom_divisor: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            framebuffer_width: 1440,
            framebuffer_height: 960,
            window_width: 1440,
            window_height: 960,
            shader_root: PathBuf::from(DEFAULT_SHADER_ROOT),
            bloom_divisor: 2,
        }
    }
}

impl RendererConfig {
    /// Framebuffers and window of the same size.
    pub fn with_resolution(width: u32, height: u32) -> Self {
        Self {
            framebuffer_width: width,
            framebuffer_height: height,
            window_width: width,
            window_height: height,
            ..Default::default()
        }
    }

    /// Parses a RON document. Missing fields take their default.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Reads and parses a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Size of the bloom buffer, never smaller than one pixel.
    pub fn bloom_size(&self) -> (u32, u32) {
        let divisor = self.bloom_divisor.max(1);
        (
            (self.framebuffer_width / divisor).max(1),
            (self.framebuffer_height / divisor).max(1),
        )
    }
}

/// An error raised while loading a [`RendererConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The document is not a valid configuration.
    Parse(ron::error::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Failed to read renderer config: {err}"),
            ConfigError::Parse(err) => write!(f, "Invalid renderer config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(err: ron::error::SpannedError) -> Self {
        ConfigError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = RendererConfig::from_ron_str("(framebuffer_width: 640, bloom_divisor: 4)")
            .unwrap();

        assert_eq!(config.framebuffer_width, 640);
        assert_eq!(config.framebuffer_height, 960);
        assert_eq!(config.bloom_size(), (160, 240));
        assert_eq!(config.shader_root, PathBuf::from(DEFAULT_SHADER_ROOT));
    }

    #[test]
    fn test_invalid_document_is_a_parse_error() {
        let result = RendererConfig::from_ron_str("(framebuffer_width: \"wide\")");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer.ron");
        let config = RendererConfig::with_resolution(256, 128);
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        std::fs::write(&path, text).unwrap();

        assert_eq!(RendererConfig::load(&path).unwrap(), config);
        assert!(matches!(
            RendererConfig::load(dir.path().join("missing.ron")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_bloom_size_never_reaches_zero() {
        let config = RendererConfig {
            bloom_divisor: 0,
            ..RendererConfig::with_resolution(1, 1)
        };
        assert_eq!(config.bloom_size(), (1, 1));
    }
}
