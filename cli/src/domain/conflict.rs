//! Connection-conflict types and the pure parsing behind conflict detection.
//!
//! The detector service gathers command output and file contents; every
//! decision about what that evidence means lives here.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::settings::GUID_PATTERN;

/// Port the legacy management server's agent listens on.
pub const SCOM_PORT: u16 = 1270;

/// Directory created under the agent configuration root for a SCOM workspace.
pub const SCOM_WORKSPACE_DIR: &str = "scom";

const MULTIPLE_CONNECTIONS_TAG: &str = "(LINUXOMSAGENTEXTENSION_ERROR_MULTIPLECONNECTIONS)";

// Compile-time constant patterns; cannot fail.
#[allow(clippy::expect_used)]
static HTTPSPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s]*httpsport[\s]*=(.*)$").expect("valid regex"));

#[allow(clippy::expect_used)]
static SCOM_ISSUER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?m)^[\s]*Issuer:[\s]*CN=SCX-Certificate/title=SCX{GUID_PATTERN}, DC=.*$"
    ))
    .expect("valid regex")
});

#[allow(clippy::expect_used)]
static GUID_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{GUID_PATTERN}$")).expect("valid regex"));

/// Answer from one port-detection source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Open,
    Closed,
    /// This source cannot answer; ask the next one.
    Undetermined,
}

impl ProbeOutcome {
    #[must_use]
    pub fn is_conclusive(self) -> bool {
        self != Self::Undetermined
    }
}

/// Why install may or may not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The target workspace is already configured; re-install is idempotent.
    AlreadyOnboardedSameWorkspace,
    OtherWorkspacePresent,
    ScomManaged,
    None,
}

/// Outcome of conflict detection for one install attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictVerdict {
    pub has_conflict: bool,
    pub reason: ConflictReason,
}

impl ConflictVerdict {
    #[must_use]
    pub fn from_reason(reason: ConflictReason) -> Self {
        let has_conflict = matches!(
            reason,
            ConflictReason::OtherWorkspacePresent | ConflictReason::ScomManaged
        );
        Self {
            has_conflict,
            reason,
        }
    }

    /// Human-readable explanation for a conflicting verdict.
    #[must_use]
    pub fn explanation(&self) -> Option<String> {
        match self.reason {
            ConflictReason::OtherWorkspacePresent => Some(format!(
                "This machine is already connected to some other Log Analytics workspace, \
please set stopOnMultipleConnections to false in public settings or remove this property, \
so this machine can connect to new workspaces, also it means this machine will get billed \
multiple times for each workspace it report to. {MULTIPLE_CONNECTIONS_TAG}"
            )),
            ConflictReason::ScomManaged => Some(format!(
                "This machine may already be connected to a System Center Operations Manager \
server. Please set stopOnMultipleConnections to false in public settings or remove this \
property to allow connection to the Log Analytics workspace. {MULTIPLE_CONNECTIONS_TAG}"
            )),
            ConflictReason::AlreadyOnboardedSameWorkspace | ConflictReason::None => None,
        }
    }
}

/// What the host's existing onboarding state says about `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceScan {
    AlreadyOnboarded,
    /// `true` when some other workspace (or a SCOM workspace) is configured.
    NotOnboarded { other_candidate: bool },
}

/// Interpret the onboarding script's workspace listing.
///
/// Any line mentioning `target` wins over every other line. A listing of
/// `no workspace` means nothing is configured.
#[must_use]
pub fn scan_workspace_listing(output: &str, target: &str) -> WorkspaceScan {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("no workspace") {
        return WorkspaceScan::NotOnboarded {
            other_candidate: false,
        };
    }
    let lines = || trimmed.lines().map(str::trim).filter(|l| !l.is_empty());
    if lines().any(|line| line.contains(target)) {
        return WorkspaceScan::AlreadyOnboarded;
    }
    WorkspaceScan::NotOnboarded {
        other_candidate: lines().next().is_some(),
    }
}

/// Interpret the directory names found under the agent configuration root.
#[must_use]
pub fn scan_config_directories<S: AsRef<str>>(names: &[S], target: &str) -> WorkspaceScan {
    if names.iter().any(|n| n.as_ref() == target) {
        return WorkspaceScan::AlreadyOnboarded;
    }
    let other_candidate = names
        .iter()
        .map(AsRef::as_ref)
        .any(|n| n == SCOM_WORKSPACE_DIR || GUID_ONLY_RE.is_match(n));
    WorkspaceScan::NotOnboarded { other_candidate }
}

/// Interpret a port-check tool's answer.
///
/// Older tool versions reject the option; that is inconclusive, not closed.
#[must_use]
pub fn tool_probe_outcome(exit_code: i32, output: &str) -> ProbeOutcome {
    let lower = output.to_lowercase();
    if ["illegal option", "unknown option", "unrecognized option"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        return ProbeOutcome::Undetermined;
    }
    match exit_code {
        0 => ProbeOutcome::Open,
        1 => ProbeOutcome::Closed,
        _ => ProbeOutcome::Undetermined,
    }
}

/// Look for `port` in the first `httpsport` directive of a server config.
///
/// The directive's value may be a comma- or space-separated list.
#[must_use]
pub fn httpsport_outcome(config_text: &str, port: u16) -> ProbeOutcome {
    let Some(value) = HTTPSPORT_RE
        .captures(config_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        return ProbeOutcome::Closed;
    };
    let wanted = port.to_string();
    if value
        .split(|c: char| c == ',' || c.is_whitespace())
        .any(|p| p == wanted)
    {
        ProbeOutcome::Open
    } else {
        ProbeOutcome::Closed
    }
}

/// Whether certificate text (as printed by `openssl x509 -text`) was issued
/// by a legacy management server.
#[must_use]
pub fn is_scom_signed(certificate_text: &str) -> bool {
    SCOM_ISSUER_RE.is_match(certificate_text)
}

/// Combine the evidence into a verdict.
///
/// SCOM management needs both the open port and the SCOM-issued certificate;
/// a mere candidate connection is reported as another workspace.
#[must_use]
pub fn decide(other_candidate: bool, port: ProbeOutcome, cert_signed: bool) -> ConflictVerdict {
    let reason = if port == ProbeOutcome::Open && cert_signed {
        ConflictReason::ScomManaged
    } else if other_candidate {
        ConflictReason::OtherWorkspacePresent
    } else {
        ConflictReason::None
    };
    ConflictVerdict::from_reason(reason)
}
