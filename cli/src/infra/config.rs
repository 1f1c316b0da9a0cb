//! Loads `HandlerConfig` from an optional YAML file.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::HandlerConfig;

/// YAML-backed handler configuration.
///
/// Without a file the production defaults apply; a file only needs the keys
/// it overrides.
pub struct YamlConfigStore {
    path: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Read `path` if given, else use the defaults.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// # Errors
    ///
    /// Returns an error if a named config file cannot be read or parsed.
    pub fn load(&self) -> Result<HandlerConfig> {
        let Some(path) = &self.path else {
            return Ok(HandlerConfig::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(HandlerConfig::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }
}
