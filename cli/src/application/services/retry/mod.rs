//! Retryable command execution.
//!
//! `run_with_retries` runs one command until its retry policy says stop or the
//! retry budget is spent, sleeping between attempts, then lets an optional
//! final policy remap (or escalate) the terminal exit code.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

pub mod policies;

use std::process::{ExitStatus, Output};
use std::time::Duration;

use crate::application::ports::{CommandRunner, Sleeper};
use crate::domain::{CommandInvocation, CommandResult, HandlerError, RetryDecision};

/// Sleep before the first retry unless the caller says otherwise.
pub const DEFAULT_INITIAL_SLEEP: Duration = Duration::from_secs(30);

/// Backoff settings for one `run_with_retries` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryOptions {
    /// Retries after the first attempt; `0` means exactly one attempt.
    pub max_retries: u32,
    pub initial_sleep: Duration,
    /// Multiplier applied to the sleep after each retry. `1.0` keeps it constant.
    pub growth_factor: f64,
}

impl RetryOptions {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_sleep: DEFAULT_INITIAL_SLEEP,
            growth_factor: 1.0,
        }
    }

    #[must_use]
    pub fn with_initial_sleep(mut self, initial_sleep: Duration) -> Self {
        self.initial_sleep = initial_sleep;
        self
    }

    #[must_use]
    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }
}

/// Decides after each attempt whether to try again.
///
/// A policy may run a corrective command before answering (see
/// `policies::PackageLockPolicy`). Closures `Fn(&CommandResult) -> RetryDecision`
/// are policies too.
#[allow(async_fn_in_trait)]
pub trait RetryPolicy {
    async fn check(&self, result: &CommandResult) -> RetryDecision;
}

impl<F> RetryPolicy for F
where
    F: Fn(&CommandResult) -> RetryDecision,
{
    async fn check(&self, result: &CommandResult) -> RetryDecision {
        self(result)
    }
}

/// Maps the last attempt's result to the exit code returned to the caller.
///
/// Returning `Err` escalates to a named failure instead of an exit code.
pub trait FinalPolicy {
    /// # Errors
    ///
    /// Returns a named `HandlerError` when the terminal result must abort the operation.
    fn apply(&self, result: &CommandResult) -> Result<i32, HandlerError>;
}

impl<F> FinalPolicy for F
where
    F: Fn(&CommandResult) -> Result<i32, HandlerError>,
{
    fn apply(&self, result: &CommandResult) -> Result<i32, HandlerError> {
        self(result)
    }
}

/// Policy that never retries.
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    async fn check(&self, _: &CommandResult) -> RetryDecision {
        RetryDecision::Stop
    }
}

/// Run `invocation` once and log its output.
///
/// A command that cannot be spawned yields the could-not-execute result
/// rather than an error.
///
/// # Errors
///
/// Returns `HandlerError::OutputNotUtf8` if the output is not valid UTF-8.
pub async fn run_command(
    runner: &impl CommandRunner,
    invocation: &CommandInvocation,
) -> Result<CommandResult, HandlerError> {
    let result = match runner.run(&invocation.command).await {
        Ok(output) => output_to_result(output)?,
        Err(e) => {
            tracing::error!("could not execute command: {e:#}");
            CommandResult::could_not_execute(&format!("{e:#}"))
        }
    };
    log_attempt(invocation, &result);
    Ok(result)
}

/// Run `invocation` with retries.
///
/// At most `options.max_retries + 1` attempts are made. The sleep before retry
/// `k` (0-based) is `initial_sleep * growth_factor^k`; no sleep follows the
/// final attempt. The engine enforces no overall time limit.
///
/// # Errors
///
/// Returns `HandlerError::OutputNotUtf8` if an attempt's output is not UTF-8
/// (not retried), or whatever named failure `final_policy` escalates to.
pub async fn run_with_retries(
    runner: &impl CommandRunner,
    sleeper: &impl Sleeper,
    invocation: &CommandInvocation,
    options: RetryOptions,
    retry_policy: &impl RetryPolicy,
    final_policy: Option<&dyn FinalPolicy>,
) -> Result<i32, HandlerError> {
    let mut retries_done: u32 = 0;
    let mut sleep = options.initial_sleep;

    let last = loop {
        let result = run_command(runner, invocation).await?;
        let RetryDecision::Retry { reason } = retry_policy.check(&result).await else {
            break result;
        };
        if retries_done >= options.max_retries {
            tracing::warn!(
                attempts = retries_done + 1,
                exit_code = result.exit_code,
                "retries exhausted"
            );
            break result;
        }
        retries_done += 1;
        tracing::info!("{reason}");
        sleeper.sleep(sleep).await;
        sleep = grow(sleep, options.growth_factor);
    };

    match final_policy {
        Some(policy) => policy.apply(&last),
        None => Ok(last.exit_code),
    }
}

/// `sleep * factor`, saturating at `Duration::MAX`; negative factors act as zero.
fn grow(sleep: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(sleep.as_secs_f64() * factor.max(0.0)).unwrap_or(Duration::MAX)
}

fn output_to_result(output: Output) -> Result<CommandResult, HandlerError> {
    let Output {
        status,
        mut stdout,
        stderr,
    } = output;
    stdout.extend_from_slice(&stderr);
    CommandResult::from_raw(exit_code_of(status), stdout)
}

/// Exit code of a finished process; a signal `n` is reported as `-n`.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

fn log_attempt(invocation: &CommandInvocation, result: &CommandResult) {
    if invocation.log_verbosely {
        tracing::info!("Output of command \"{}\": \n{}", invocation.command, result.output);
    } else {
        tracing::info!("Output: \n{}", result.output);
    }
    if invocation.check_error && !result.success() {
        if invocation.log_verbosely {
            tracing::error!(
                exit_code = result.exit_code,
                "command \"{}\" failed",
                invocation.command
            );
        } else {
            tracing::error!(exit_code = result.exit_code, "command failed");
        }
    }
}
