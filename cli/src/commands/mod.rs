//! Operation dispatch and status reporting.
//!
//! Every invocation ends in exactly one status report and one process exit
//! code, whatever the operation's outcome.

use anyhow::Result;

use crate::app::HandlerContext;
use crate::application::ports::{CommandRunner, HostFs, SettingsProvider, Sleeper, StatusSink};
use crate::application::services::{Host, disable, enable, install, uninstall};
use crate::domain::status::outcome_message;
use crate::domain::{HandlerError, Operation, StatusReport, exit_code};

/// Operation name reported when the requested one is not recognised.
pub const UNKNOWN_OPERATION: &str = "Unknown";

/// Run the operation named by `requested` and report its outcome.
///
/// Returns the process exit code.
pub async fn run(ctx: &HandlerContext, requested: &str) -> i32 {
    let sink = ctx.status_sink();
    let Ok(operation) = requested.parse::<Operation>() else {
        tracing::error!("No valid operation provided: {requested:?}");
        return report(
            &sink,
            &StatusReport::new(
                UNKNOWN_OPERATION,
                exit_code::GENERIC_FAILURE,
                "No valid operation provided",
            ),
        );
    };

    tracing::info!("{operation} started");
    let outcome = execute(&ctx.host(), &ctx.settings_provider(), operation).await;
    report(&sink, &status_for(operation, &outcome))
}

/// Run one lifecycle operation against the given ports.
///
/// # Errors
///
/// Returns the operation's failure; named failures are `HandlerError`s.
pub async fn execute<R, S, F>(
    host: &Host<'_, R, S, F>,
    settings: &impl SettingsProvider,
    operation: Operation,
) -> Result<i32>
where
    R: CommandRunner,
    S: Sleeper,
    F: HostFs,
{
    match operation {
        Operation::Install => install::install(host, settings).await,
        Operation::Enable => enable::enable(host, settings).await,
        Operation::Disable => disable::disable(host).await,
        Operation::Uninstall => uninstall::uninstall(host).await,
        Operation::Update => Ok(exit_code::SUCCESS),
    }
}

/// Status report for an operation's outcome.
///
/// Named failures carry their own exit code and message; any other error is
/// a generic failure with its context chain as the message.
#[must_use]
pub fn status_for(operation: Operation, outcome: &Result<i32>) -> StatusReport {
    let name = operation.name();
    match outcome {
        Ok(code) => StatusReport::new(name, *code, outcome_message(operation, *code)),
        Err(e) => match e.downcast_ref::<HandlerError>() {
            Some(named) => StatusReport::new(name, named.exit_code(), named.status_message(name)),
            None => StatusReport::new(
                name,
                exit_code::GENERIC_FAILURE,
                format!("{name} failed with error: {e:#}"),
            ),
        },
    }
}

/// Hand `status` to the sink and return its exit code.
///
/// A status that cannot be written is logged; it never changes the exit code.
pub fn report(sink: &impl StatusSink, status: &StatusReport) -> i32 {
    if status.exit_code == exit_code::SUCCESS {
        tracing::info!("{}", status.message);
    } else {
        tracing::error!(exit_code = status.exit_code, "{}", status.message);
    }
    if let Err(e) = sink.report(status) {
        tracing::error!("Unable to write status: {e:#}");
    }
    status.exit_code
}
