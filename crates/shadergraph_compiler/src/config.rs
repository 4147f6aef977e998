// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiler configuration stored as RON.
//!
//! ```ron
//! (
//!     options: (language: glsl, optimize: true, entryPoint: mainImage),
//!     session: (debounce_ms: 500),
//! )
//! ```

use crate::compiler::CompileOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "shadergraph.ron";

/// Compile session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period after the last edit before compiling, in milliseconds
    pub debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl SessionConfig {
    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Top-level compiler configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Options applied to every compile
    pub options: CompileOptions,
    /// Session settings
    pub session: SessionConfig,
}

impl CompilerConfig {
    /// Parse configuration from RON text
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&content)?;
        tracing::debug!(path = %path.display(), "loaded compiler config");
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_ron()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Error loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// RON syntax or shape error
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failure
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::EntryPoint;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert!(config.options.optimize);
        assert_eq!(config.session.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = CompilerConfig::from_ron("(options: (optimize: false))").unwrap();
        assert!(!config.options.optimize);
        assert_eq!(config.options.entry_point, EntryPoint::Main);
        assert_eq!(config.session.debounce_ms, 500);
    }

    #[test]
    fn test_full_config() {
        let config = CompilerConfig::from_ron(
            "(options: (language: glsl, optimize: true, entryPoint: mainImage), session: (debounce_ms: 250))",
        )
        .unwrap();
        assert_eq!(config.options.entry_point, EntryPoint::MainImage);
        assert_eq!(config.session.debounce_ms, 250);
    }

    #[test]
    fn test_round_trip_through_ron() {
        let mut config = CompilerConfig::default();
        config.session.debounce_ms = 100;
        config.options.optimize = false;
        let text = config.to_ron().unwrap();
        assert_eq!(CompilerConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            CompilerConfig::from_ron("(options: (optimize: maybe))"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = CompilerConfig::load(Path::new("/nonexistent/shadergraph.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
