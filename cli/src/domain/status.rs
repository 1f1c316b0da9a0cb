//! Operation outcome reported to the hosting agent.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::exit_code;
use crate::domain::operation::Operation;

/// Extension name the hosting agent knows this handler by.
pub const EXTENSION_NAME: &str = "Microsoft.EnterpriseCloud.Monitoring.OmsAgentForLinux";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Success,
    Failed,
}

/// One operation outcome: what the status sink receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Operation name, or `Unknown` when none could be parsed.
    pub operation: String,
    pub exit_code: i32,
    pub state: StatusState,
    pub message: String,
}

impl StatusReport {
    #[must_use]
    pub fn new(operation: impl Into<String>, exit_code: i32, message: impl Into<String>) -> Self {
        let state = if exit_code == exit_code::SUCCESS {
            StatusState::Success
        } else {
            StatusState::Failed
        };
        Self {
            operation: operation.into(),
            exit_code,
            state,
            message: message.into(),
        }
    }
}

/// Message for an operation that returned `code` without a named failure.
#[must_use]
pub fn outcome_message(operation: Operation, code: i32) -> String {
    match (operation, code) {
        (_, exit_code::SUCCESS) => format!("{operation} succeeded"),
        (Operation::Install, exit_code::GENERIC_FAILURE) => "Install failed with exit code 1. \
Please check that dependencies are installed. For details, check logs in \
/var/log/azure/Microsoft.EnterpriseCloud.Monitoring.OmsAgentForLinux"
            .to_string(),
        (Operation::Install, exit_code::PACKAGE_MANAGER_LOCKED) => format!(
            "Install failed with exit code {code} because the package manager on the VM is \
currently locked: please wait and try again"
        ),
        _ => format!("{operation} failed with exit code {code}"),
    }
}

/// On-disk status document: a one-element array in the hosting agent's format.
#[derive(Debug, Serialize)]
pub struct StatusDocument {
    pub version: String,
    #[serde(rename = "timestampUTC")]
    pub timestamp_utc: String,
    pub status: StatusBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub name: String,
    pub operation: String,
    pub status: StatusState,
    /// The hosting agent expects the code as a string.
    pub code: String,
    pub formatted_message: FormattedMessage,
}

#[derive(Debug, Serialize)]
pub struct FormattedMessage {
    pub lang: String,
    pub message: String,
}

impl StatusDocument {
    #[must_use]
    pub fn new(report: &StatusReport, version: &str, now: DateTime<Utc>) -> Self {
        Self {
            version: version.to_string(),
            timestamp_utc: now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            status: StatusBody {
                name: EXTENSION_NAME.to_string(),
                operation: report.operation.clone(),
                status: report.state,
                code: report.exit_code.to_string(),
                formatted_message: FormattedMessage {
                    lang: "en-US".to_string(),
                    message: report.message.clone(),
                },
            },
        }
    }
}
