//! The hosting agent's `HandlerEnvironment.json` and settings sequence number.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const HANDLER_ENVIRONMENT_FILE: &str = "HandlerEnvironment.json";

/// Handler environment as written by the hosting agent.
///
/// The file holds either this object or a one-element array of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerEnvironment {
    #[serde(default)]
    pub version: Option<serde_json::Value>,
    #[serde(default, rename = "handlerEnvironment")]
    pub folders: HandlerFolders,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerFolders {
    #[serde(default)]
    pub config_folder: Option<PathBuf>,
    #[serde(default)]
    pub status_folder: Option<PathBuf>,
    #[serde(default)]
    pub log_folder: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvironmentFile {
    List(Vec<HandlerEnvironment>),
    Single(HandlerEnvironment),
}

impl HandlerEnvironment {
    /// Load `HandlerEnvironment.json` from `handler_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load(handler_dir: &Path) -> Result<Self> {
        let path = handler_dir.join(HANDLER_ENVIRONMENT_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let parsed: EnvironmentFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(match parsed {
            EnvironmentFile::List(list) => list.into_iter().next().unwrap_or_default(),
            EnvironmentFile::Single(env) => env,
        })
    }

    /// Extension version for status reports; `1.0` when unknown.
    #[must_use]
    pub fn version(&self) -> String {
        match &self.version {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => "1.0".to_string(),
        }
    }

    #[must_use]
    pub fn config_folder(&self, handler_dir: &Path) -> PathBuf {
        self.folders
            .config_folder
            .clone()
            .unwrap_or_else(|| handler_dir.join("config"))
    }

    #[must_use]
    pub fn status_folder(&self, handler_dir: &Path) -> PathBuf {
        self.folders
            .status_folder
            .clone()
            .unwrap_or_else(|| handler_dir.join("status"))
    }

    #[must_use]
    pub fn log_folder(&self) -> Option<&Path> {
        self.folders.log_folder.as_deref()
    }
}

/// Sequence number of the most recently modified `<N>.settings` file in
/// `config_folder`, or `0` when there is none.
#[must_use]
pub fn latest_sequence_number(config_folder: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(config_folder) else {
        return 0;
    };
    let mut latest: Option<(SystemTime, u64)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(seq) = name.to_str().and_then(parse_settings_file_name) else {
            continue;
        };
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if latest.is_none_or(|(time, _)| modified > time) {
            latest = Some((modified, seq));
        }
    }
    latest.map_or(0, |(_, seq)| seq)
}

/// `"12.settings"` → `Some(12)`. At most ten digits.
fn parse_settings_file_name(name: &str) -> Option<u64> {
    let digits = name.strip_suffix(".settings")?;
    if digits.is_empty() || digits.len() > 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
