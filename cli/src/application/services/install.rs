//! Application service: install the agent bundle.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use anyhow::{Context, Result};

use super::Host;
use crate::application::ports::{CommandRunner, HostFs, SettingsProvider, Sleeper};
use crate::application::services::conflict::ConflictDetector;
use crate::application::services::ensure_supported_os;
use crate::application::services::retry::policies::{FinalLockPolicy, PackageLockPolicy};
use crate::application::services::retry::{RetryOptions, run_with_retries};
use crate::domain::{CommandInvocation, HandlerError};

/// Retries for the bundle; the hosting agent gives install 15 minutes.
pub const INSTALL_RETRIES: u32 = 15;

/// Install (or upgrade) the agent bundle.
///
/// When the public settings opt into `stopOnMultipleConnections`, conflict
/// detection runs first and a conflicting verdict aborts before the package
/// manager is touched.
///
/// # Errors
///
/// Returns a `HandlerError` for unsupported hosts, missing or invalid settings
/// and conflicting connections; other errors when the bundle cannot be prepared.
pub async fn install<R, S, F>(
    host: &Host<'_, R, S, F>,
    settings: &impl SettingsProvider,
) -> Result<i32>
where
    R: CommandRunner,
    S: Sleeper,
    F: HostFs,
{
    ensure_supported_os(host.fs, &host.config.paths.os_release)?;

    let settings = settings.settings().await?;
    let public = settings.require_public()?;
    let workspace_id = public.workspace_id()?;

    if public.stop_on_multiple_connections() {
        let detector =
            ConflictDetector::new(host.runner, host.fs, &host.config.paths, host.config.scom_port);
        let verdict = detector.detect(workspace_id).await;
        if let Some(explanation) = verdict.explanation() {
            return Err(HandlerError::MultipleConnections(explanation).into());
        }
    }

    let bundle = host.config.bundle_path(host.handler_dir);
    host.fs
        .set_owner_executable(&bundle)
        .with_context(|| format!("preparing bundle {}", bundle.display()))?;

    let invocation = CommandInvocation::new(format!("{} --upgrade", bundle.display()));
    tracing::info!("Running command \"{}\"", invocation.command);

    // Concurrent package operations on the host make install fail transiently.
    let code = run_with_retries(
        host.runner,
        host.sleeper,
        &invocation,
        RetryOptions::new(INSTALL_RETRIES),
        &PackageLockPolicy::new(host.runner),
        Some(&FinalLockPolicy),
    )
    .await?;
    Ok(code)
}
