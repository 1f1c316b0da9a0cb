//! Application service: stop the agent's workspace processes.

use anyhow::Result;

use super::Host;
use crate::application::ports::{CommandRunner, HostFs};
use crate::application::services::retry::run_command;
use crate::domain::{CommandInvocation, HandlerError};

/// Disable every workspace process of the agent.
///
/// # Errors
///
/// Returns `HandlerError::DisableBeforeInstall` when the service control
/// script is missing.
pub async fn disable<R, S, F>(host: &Host<'_, R, S, F>) -> Result<i32>
where
    R: CommandRunner,
    F: HostFs,
{
    let script = &host.config.paths.service_control;
    if !host.fs.exists(script) {
        return Err(HandlerError::DisableBeforeInstall(script.display().to_string()).into());
    }
    let result = run_command(
        host.runner,
        &CommandInvocation::new(format!("{} disable", script.display())),
    )
    .await?;
    Ok(result.exit_code)
}
