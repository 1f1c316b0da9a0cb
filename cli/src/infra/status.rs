//! Infrastructure implementation of the `StatusSink` port.
//!
//! `StatusFileSink` writes `<status_folder>/<seq>.status` with an atomic
//! write (temp file + rename) so the hosting agent never reads a partial file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::StatusSink;
use crate::domain::StatusReport;
use crate::domain::status::StatusDocument;

/// Status file writer for one settings sequence number.
pub struct StatusFileSink {
    path: PathBuf,
    version: String,
}

impl StatusFileSink {
    #[must_use]
    pub fn new(status_folder: PathBuf, sequence_number: u64, version: impl Into<String>) -> Self {
        Self {
            path: status_folder.join(format!("{sequence_number}.status")),
            version: version.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StatusSink for StatusFileSink {
    fn report(&self, report: &StatusReport) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let document = [StatusDocument::new(report, &self.version, Utc::now())];
        let content = serde_json::to_string(&document).context("serializing status")?;

        let temp_path = self.path.with_extension("status.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("finalizing status file {}", self.path.display()))?;
        Ok(())
    }
}
