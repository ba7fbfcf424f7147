//! Configuration loader
//!
//! `defaults/clove.default.toml` is embedded into the library so that docs and runtime
//! behavior stay in sync. Callers layer user files and single-key overrides on top of it
//! with [`Loader`] before deserializing into [`CloveConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/clove.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CloveConfig {
    pub scanner: ScannerConfig,
    pub snapshot: SnapshotConfig,
}

/// Knobs for a scanning session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScannerConfig {
    pub stall_limit: usize,
    /// Applied when the grammar's patterns are compiled.
    pub backtrack_limit: usize,
    pub merge_tokens: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            stall_limit: 32,
            backtrack_limit: 1_000_000,
            merge_tokens: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SnapshotConfig {
    pub fixture_suffix: String,
    pub snapshot_suffix: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            fixture_suffix: ".test.clove".to_string(),
            snapshot_suffix: ".snap".to_string(),
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

    /// Apply a single key/value override, e.g. from a command-line flag.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<CloveConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<CloveConfig, ConfigError> {
    Loader::new().build()
}
