//! Filesystem infrastructure: implements `HostFs` over `std::fs`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::HostFs;

/// Production filesystem implementation of `HostFs`.
#[derive(Debug, Default)]
pub struct StdHostFs;

impl HostFs for StdHostFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn subdirectory_names(&self, root: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir)
                .with_context(|| format!("listing directory {}", dir.display()))?;
            for entry in entries {
                let entry = entry.with_context(|| format!("listing directory {}", dir.display()))?;
                if entry.file_type().is_ok_and(|t| t.is_dir()) {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                    pending.push(entry.path());
                }
            }
        }
        Ok(names)
    }

    fn set_owner_executable(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
                .with_context(|| format!("setting permissions on {}", path.display()))?;
        }
        #[cfg(not(unix))]
        {
            anyhow::ensure!(path.exists(), "{} does not exist", path.display());
        }
        Ok(())
    }
}
