//! Application service: remove the agent bundle.
//!
//! A soft uninstall: packages are removed, configuration is not purged.

use anyhow::{Context, Result};

use super::Host;
use crate::application::ports::{CommandRunner, HostFs, Sleeper};
use crate::application::services::retry::policies::{FinalLockPolicy, PackageLockPolicy};
use crate::application::services::retry::{RetryOptions, run_with_retries};
use crate::domain::CommandInvocation;

/// The hosting agent gives uninstall 5 minutes.
pub const UNINSTALL_RETRIES: u32 = 5;

/// Remove the agent packages.
///
/// # Errors
///
/// Returns an error if the bundle cannot be prepared or its output is not UTF-8.
pub async fn uninstall<R, S, F>(host: &Host<'_, R, S, F>) -> Result<i32>
where
    R: CommandRunner,
    S: Sleeper,
    F: HostFs,
{
    let bundle = host.config.bundle_path(host.handler_dir);
    host.fs
        .set_owner_executable(&bundle)
        .with_context(|| format!("preparing bundle {}", bundle.display()))?;

    let invocation = CommandInvocation::new(format!("{} --remove", bundle.display()));
    tracing::info!("Running command \"{}\"", invocation.command);

    let code = run_with_retries(
        host.runner,
        host.sleeper,
        &invocation,
        RetryOptions::new(UNINSTALL_RETRIES),
        &PackageLockPolicy::new(host.runner),
        Some(&FinalLockPolicy),
    )
    .await?;
    Ok(code)
}
