//! Application service: onboard the agent to a workspace.

use std::time::Duration;

use anyhow::Result;

use super::Host;
use crate::application::ports::{CommandRunner, HostFs, SettingsProvider, Sleeper};
use crate::application::services::ensure_supported_os;
use crate::application::services::retry::policies::{NoInternetPolicy, OnboardingPolicy};
use crate::application::services::retry::{RetryOptions, run_command, run_with_retries};
use crate::domain::{CommandInvocation, HandlerConfig, HandlerError};

pub const ONBOARD_RETRIES: u32 = 5;

/// Pause between onboarding and restarting the agent's processes.
pub const RESTART_DELAY: Duration = Duration::from_secs(5);

/// Onboarding command line. Carries the workspace key; never log it.
#[must_use]
pub fn onboard_command(
    config: &HandlerConfig,
    workspace_id: &str,
    workspace_key: &str,
    proxy: Option<&str>,
    vm_resource_id: Option<&str>,
) -> String {
    let mut cmd = format!(
        "{} -d {} -w {workspace_id} -s {workspace_key}",
        config.paths.omsadmin.display(),
        config.onboarding_domain
    );
    if let Some(proxy) = proxy {
        cmd.push_str(&format!(" -p {proxy}"));
    }
    if let Some(id) = vm_resource_id {
        cmd.push_str(&format!(" -a {id}"));
    }
    cmd
}

/// Onboard the agent to the configured workspace and restart its processes.
///
/// # Errors
///
/// Returns a `HandlerError` for unsupported hosts, missing or invalid
/// settings, a missing onboarding script, or an unreachable service.
pub async fn enable<R, S, F>(
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
    let protected = settings.require_protected()?;
    let workspace_id = public.workspace_id()?;
    let workspace_key = protected.workspace_key()?;

    let omsadmin = &host.config.paths.omsadmin;
    if !host.fs.exists(omsadmin) {
        return Err(HandlerError::EnableBeforeInstall(omsadmin.display().to_string()).into());
    }

    let invocation = CommandInvocation::new(onboard_command(
        host.config,
        workspace_id,
        workspace_key,
        protected.proxy.as_deref(),
        protected.vm_resource_id.as_deref(),
    ))
    .redacted();

    tracing::info!("Handler initiating onboarding.");
    let code = run_with_retries(
        host.runner,
        host.sleeper,
        &invocation,
        RetryOptions::new(ONBOARD_RETRIES),
        &OnboardingPolicy,
        Some(&NoInternetPolicy),
    )
    .await?;

    // Processes auto-started by the bundle's --upgrade may be stale.
    if code == 0 {
        host.sleeper.sleep(RESTART_DELAY).await;
        let restart = CommandInvocation::new(format!(
            "{} restart",
            host.config.paths.service_control.display()
        ));
        run_command(host.runner, &restart).await?;
    }
    Ok(code)
}
