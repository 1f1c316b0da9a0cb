//! Retry and final policies used by the lifecycle operations.

use std::sync::LazyLock;

use regex::Regex;

use super::{FinalPolicy, RetryPolicy, run_command};
use crate::application::ports::CommandRunner;
use crate::domain::{CommandInvocation, CommandResult, HandlerError, RetryDecision, exit_code};

// Compile-time constant pattern; cannot fail.
#[allow(clippy::expect_used)]
static DPKG_LOCKED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^.*dpkg.+lock.*$").expect("valid regex"));

/// Whether a failed result reports the package manager database as locked,
/// e.g. `dpkg status database is locked by another process`.
#[must_use]
pub fn is_package_manager_locked(result: &CommandResult) -> bool {
    !result.success() && DPKG_LOCKED_RE.is_match(&result.output)
}

/// Retries while the package manager is locked, or when the bundle could not
/// find curl on a host whose package lists can be refreshed.
///
/// In the curl case the policy runs `apt-get update` once itself before
/// asking for a retry.
pub struct PackageLockPolicy<'a, R> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> PackageLockPolicy<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    async fn apt_get_available(&self) -> bool {
        let probe = CommandInvocation::new("which apt-get").unchecked().redacted();
        matches!(run_command(self.runner, &probe).await, Ok(r) if r.success())
    }
}

impl<R: CommandRunner> RetryPolicy for PackageLockPolicy<'_, R> {
    async fn check(&self, result: &CommandResult) -> RetryDecision {
        if is_package_manager_locked(result) {
            return RetryDecision::retry("Retrying command because package manager is locked.");
        }
        if result.exit_code == exit_code::CURL_NOT_INSTALLED && self.apt_get_available().await {
            tracing::info!("Updating package lists to make curl available");
            if let Err(e) = run_command(self.runner, &CommandInvocation::new("apt-get update")).await
            {
                tracing::warn!("apt-get update failed: {e}");
            }
            return RetryDecision::retry(
                "Retrying command because package lists needed to be updated",
            );
        }
        RetryDecision::Stop
    }
}

/// Retries onboarding on 403 (stale agent id/certificate) and on any other
/// non-200 answer from the service (transient unavailability).
pub struct OnboardingPolicy;

impl RetryPolicy for OnboardingPolicy {
    async fn check(&self, result: &CommandResult) -> RetryDecision {
        match result.exit_code {
            exit_code::ONBOARD_FORBIDDEN => RetryDecision::retry(
                "Retrying the onboarding command to attempt generating a new agent ID and \
certificate.",
            ),
            exit_code::ONBOARD_NON_200 => {
                RetryDecision::retry("Retrying; the OMS service may be temporarily unavailable.")
            }
            _ => RetryDecision::Stop,
        }
    }
}

/// Remaps a result that is still locked after retries to the documented lock code.
pub struct FinalLockPolicy;

impl FinalPolicy for FinalLockPolicy {
    fn apply(&self, result: &CommandResult) -> Result<i32, HandlerError> {
        if is_package_manager_locked(result) {
            Ok(exit_code::PACKAGE_MANAGER_LOCKED)
        } else {
            Ok(result.exit_code)
        }
    }
}

/// Escalates "could not resolve host" to `HandlerError::CannotConnect`.
pub struct NoInternetPolicy;

impl FinalPolicy for NoInternetPolicy {
    fn apply(&self, result: &CommandResult) -> Result<i32, HandlerError> {
        if result.exit_code == exit_code::HOST_UNRESOLVABLE {
            return Err(HandlerError::CannotConnect);
        }
        Ok(result.exit_code)
    }
}
