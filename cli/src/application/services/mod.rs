//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`: never from `crate::infra`, `crate::commands`,
//! or `crate::cli`.

pub mod conflict;
pub mod disable;
pub mod enable;
pub mod install;
pub mod retry;
pub mod uninstall;

use std::path::Path;

use crate::application::ports::HostFs;
use crate::domain::{HandlerConfig, HandlerError, HostDistro};

/// The host-facing ports and configuration every lifecycle use-case needs.
pub struct Host<'a, R, S, F> {
    pub runner: &'a R,
    pub sleeper: &'a S,
    pub fs: &'a F,
    pub config: &'a HandlerConfig,
    /// Directory holding `HandlerEnvironment.json` and the agent bundle.
    pub handler_dir: &'a Path,
}

/// Fail with `UnsupportedOs` unless the host distro is on the whitelist.
///
/// An unreadable os-release file counts as an unknown, unsupported distro.
///
/// # Errors
///
/// Returns `HandlerError::UnsupportedOs` for unsupported or unknown distros.
pub fn ensure_supported_os(fs: &impl HostFs, os_release: &Path) -> Result<(), HandlerError> {
    let distro = fs
        .read_to_string(os_release)
        .ok()
        .and_then(|text| HostDistro::from_os_release(&text));
    match distro {
        Some(d) if d.is_supported() => Ok(()),
        Some(d) => Err(HandlerError::UnsupportedOs {
            distro: d.name,
            version: d.version,
        }),
        None => Err(HandlerError::UnsupportedOs {
            distro: "unknown".to_string(),
            version: String::new(),
        }),
    }
}
