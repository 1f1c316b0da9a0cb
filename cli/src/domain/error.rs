//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use crate::domain::exit_code;

// ── Handler errors ────────────────────────────────────────────────────────────

/// Named failure conditions that abort an operation with a specific exit code.
///
/// Anything not represented here is unclassified and surfaces as the generic
/// failure code with its full error chain in the status message.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    #[error("{0}")]
    ParameterMissing(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    MultipleConnections(String),

    #[error(
        "The agent could not connect to the Microsoft Operations Management Suite service. \
Please check that the system either has Internet access, or that a valid HTTP proxy has been \
configured for the agent. Please also check the correctness of the workspace ID."
    )]
    CannotConnect,

    #[error("Unsupported operation system: {distro} {version}")]
    UnsupportedOs { distro: String, version: String },

    #[error("OMSAgent onboarding script {0} does not exist. Enable cannot be called before install.")]
    EnableBeforeInstall(String),

    #[error(
        "OMSAgent service control script {0} does not exist. Disable cannot be called before install."
    )]
    DisableBeforeInstall(String),

    #[error("OpenSSL is not available")]
    UnsupportedOpenSsl,

    #[error("{0}")]
    ProtectedSettingsUnreadable(String),

    #[error("output of command is not valid UTF-8")]
    OutputNotUtf8,
}

impl HandlerError {
    /// Exit code reported to the hosting agent for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ParameterMissing(_) => exit_code::MISSING_PARAMETER,
            Self::InvalidParameter(_) => exit_code::INVALID_PARAMETER,
            Self::MultipleConnections(_) => exit_code::MULTIPLE_CONNECTIONS,
            Self::CannotConnect => exit_code::NO_INTERNET,
            Self::UnsupportedOs { .. } => exit_code::UNSUPPORTED_OS,
            Self::EnableBeforeInstall(_) => exit_code::ENABLE_BEFORE_INSTALL,
            Self::UnsupportedOpenSsl => exit_code::UNSUPPORTED_OPENSSL,
            Self::DisableBeforeInstall(_)
            | Self::ProtectedSettingsUnreadable(_)
            | Self::OutputNotUtf8 => exit_code::GENERIC_FAILURE,
        }
    }

    /// Status message for `operation`, in the wording the hosting agent surfaces.
    #[must_use]
    pub fn status_message(&self, operation: &str) -> String {
        match self {
            Self::ParameterMissing(msg) => {
                format!("{operation} failed due to a missing parameter: {msg}")
            }
            Self::InvalidParameter(msg) => {
                format!("{operation} failed due to an invalid parameter: {msg}")
            }
            Self::MultipleConnections(msg) => {
                format!("{operation} failed due to multiple connections: {msg}")
            }
            Self::OutputNotUtf8 | Self::ProtectedSettingsUnreadable(_) => {
                format!("{operation} failed with error: {self}")
            }
            _ => self.to_string(),
        }
    }
}
