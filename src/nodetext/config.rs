//! Configuration loading
//!
//! `defaults/nodetext.default.toml` is embedded into the library so that docs and
//! runtime behavior stay in sync. Callers layer project-specific files on top of
//! those defaults via [`Loader`] before deserializing into [`Settings`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/nodetext.default.toml");

/// Top-level settings consumed by the parser, compiler and project index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub parsing: ParsingSettings,
    pub compile: CompileSettings,
    pub project: ProjectSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsingSettings {
    pub title_length: usize,
    pub hash_key: String,
    pub timestamp_formats: Vec<String>,
    pub max_healing_attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompileSettings {
    pub default_show: String,
    pub default_spaces: usize,
    pub max_passes: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectSettings {
    pub extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            parsing: ParsingSettings {
                title_length: 100,
                hash_key: "#".to_string(),
                timestamp_formats: [
                    "%a., %b. %d, %Y, %I:%M %p",
                    "%a., %b. %d, %Y, %H:%M",
                    "%Y-%m-%d %H:%M:%S",
                    "%Y-%m-%d %H:%M",
                    "%Y-%m-%d",
                    "%B %d, %Y",
                    "%b %d, %Y",
                    "%m/%d/%Y",
                ]
                .iter()
                .map(|f| f.to_string())
                .collect(),
                max_healing_attempts: 2,
            },
            compile: CompileSettings {
                default_show: "$title $link\n".to_string(),
                default_spaces: 0,
                max_passes: 5,
            },
            project: ProjectSettings {
                extensions: vec!["txt".to_string()],
            },
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting settings.
    pub fn build(self) -> Result<Settings, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<Settings, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let settings = load_defaults().expect("defaults to deserialize");
        assert_eq!(settings.parsing.title_length, 100);
        assert_eq!(settings.parsing.max_healing_attempts, 2);
        assert_eq!(settings.compile.default_show, "$title $link\n");
    }

    #[test]
    fn embedded_defaults_match_default_impl() {
        let settings = load_defaults().expect("defaults to deserialize");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn supports_overrides() {
        let settings = Loader::new()
            .set_override("parsing.title_length", 20i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(settings.parsing.title_length, 20);
    }

    #[test]
    fn layers_project_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[compile]\nmax_passes = 9").expect("write");

        let settings = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(settings.compile.max_passes, 9);
        assert_eq!(settings.compile.default_spaces, 0);
    }

    #[test]
    fn optional_file_may_be_missing() {
        let settings = Loader::new()
            .with_optional_file("/definitely/not/here.toml")
            .build()
            .expect("config to build");
        assert_eq!(settings, Settings::default());
    }
}
