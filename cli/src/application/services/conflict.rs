//! Application service: connection-conflict detection before install.
//!
//! Decides whether the host already reports to another workspace or is
//! managed by a legacy SCOM server. Every missing file or tool means "this
//! source cannot answer"; detection degrades through the remaining sources
//! and never fails the install on its own.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use crate::application::ports::{CommandRunner, HostFs};
use crate::application::services::retry::run_command;
use crate::domain::conflict::{
    self, ConflictReason, ConflictVerdict, ProbeOutcome, WorkspaceScan,
};
use crate::domain::{CommandInvocation, HostPaths};

/// Sources that can tell whether the SCOM port is open, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortProbe {
    /// `omsadmin.sh -o`
    OnboardingScript,
    /// `omiconfigeditor httpsport -q <port> < omiserver.conf`
    ConfigEditor,
    /// Reading `omiserver.conf` directly.
    ServerConfig,
}

impl PortProbe {
    const ORDER: [Self; 3] = [Self::OnboardingScript, Self::ConfigEditor, Self::ServerConfig];
}

/// Conflict detector bound to the host's paths and tools.
pub struct ConflictDetector<'a, R, F> {
    runner: &'a R,
    fs: &'a F,
    paths: &'a HostPaths,
    scom_port: u16,
}

impl<'a, R: CommandRunner, F: HostFs> ConflictDetector<'a, R, F> {
    #[must_use]
    pub fn new(runner: &'a R, fs: &'a F, paths: &'a HostPaths, scom_port: u16) -> Self {
        Self {
            runner,
            fs,
            paths,
            scom_port,
        }
    }

    /// Compute a fresh verdict for installing `target_workspace_id`.
    pub async fn detect(&self, target_workspace_id: &str) -> ConflictVerdict {
        let other_candidate = match self.scan_workspaces(target_workspace_id).await {
            WorkspaceScan::AlreadyOnboarded => {
                tracing::info!(
                    "The workspace to be enabled has already been configured on the VM before; \
continuing despite stopOnMultipleConnections flag"
                );
                return ConflictVerdict::from_reason(ConflictReason::AlreadyOnboardedSameWorkspace);
            }
            WorkspaceScan::NotOnboarded { other_candidate } => other_candidate,
        };
        if other_candidate {
            tracing::info!("another connection is configured; verifying SCOM management");
        }

        let port = self.probe_scom_port().await;
        let cert_signed = match port {
            ProbeOutcome::Open => self.certificate_signed_by_scom().await,
            ProbeOutcome::Closed => false,
            ProbeOutcome::Undetermined => {
                tracing::info!("SCOM port could not be determined to be open");
                false
            }
        };

        let verdict = conflict::decide(other_candidate, port, cert_signed);
        tracing::info!(
            reason = ?verdict.reason,
            has_conflict = verdict.has_conflict,
            "connection conflict check complete"
        );
        verdict
    }

    async fn scan_workspaces(&self, target: &str) -> WorkspaceScan {
        if self.fs.exists(&self.paths.omsadmin) {
            let listing =
                CommandInvocation::new(format!("{} -l", self.paths.omsadmin.display())).unchecked();
            match run_command(self.runner, &listing).await {
                Ok(result) => return conflict::scan_workspace_listing(&result.output, target),
                Err(e) => tracing::warn!("workspace listing unreadable, scanning directories: {e}"),
            }
        }
        match self.fs.subdirectory_names(&self.paths.agent_config_root) {
            Ok(names) => conflict::scan_config_directories(&names, target),
            Err(e) => {
                tracing::debug!("no agent configuration directories: {e:#}");
                WorkspaceScan::NotOnboarded {
                    other_candidate: false,
                }
            }
        }
    }

    /// First conclusive answer across the probe sources, in order.
    async fn probe_scom_port(&self) -> ProbeOutcome {
        for probe in PortProbe::ORDER {
            let outcome = self.run_probe(probe).await;
            tracing::debug!(?probe, ?outcome, "SCOM port probe");
            if outcome.is_conclusive() {
                return outcome;
            }
        }
        ProbeOutcome::Undetermined
    }

    async fn run_probe(&self, probe: PortProbe) -> ProbeOutcome {
        let paths = self.paths;
        match probe {
            PortProbe::OnboardingScript => {
                if !self.fs.exists(&paths.omsadmin) {
                    return ProbeOutcome::Undetermined;
                }
                self.run_tool_probe(format!("{} -o", paths.omsadmin.display()))
                    .await
            }
            PortProbe::ConfigEditor => {
                if !self.fs.exists(&paths.omi_config_editor)
                    || !self.fs.exists(&paths.omi_server_conf)
                {
                    return ProbeOutcome::Undetermined;
                }
                self.run_tool_probe(format!(
                    "{} httpsport -q {} < {}",
                    paths.omi_config_editor.display(),
                    self.scom_port,
                    paths.omi_server_conf.display()
                ))
                .await
            }
            PortProbe::ServerConfig => {
                if !self.fs.exists(&paths.omi_server_conf) {
                    return ProbeOutcome::Undetermined;
                }
                match self.fs.read_to_string(&paths.omi_server_conf) {
                    Ok(text) => {
                        let outcome = conflict::httpsport_outcome(&text, self.scom_port);
                        tracing::info!(
                            "SCOM port is {}listed in {}",
                            if outcome == ProbeOutcome::Open { "" } else { "not " },
                            paths.omi_server_conf.display()
                        );
                        outcome
                    }
                    Err(e) => {
                        tracing::warn!("cannot read server config: {e:#}");
                        ProbeOutcome::Undetermined
                    }
                }
            }
        }
    }

    async fn run_tool_probe(&self, command: String) -> ProbeOutcome {
        let invocation = CommandInvocation::new(command).unchecked();
        let outcome = match run_command(self.runner, &invocation).await {
            Ok(result) => conflict::tool_probe_outcome(result.exit_code, &result.output),
            Err(e) => {
                tracing::warn!("port probe output unreadable: {e}");
                ProbeOutcome::Undetermined
            }
        };
        match outcome {
            ProbeOutcome::Open => {
                tracing::info!("According to {}, SCOM port is open", invocation.command);
            }
            ProbeOutcome::Closed => {
                tracing::info!("According to {}, SCOM port is not open", invocation.command);
            }
            ProbeOutcome::Undetermined => {}
        }
        outcome
    }

    /// Whether the local SCX certificate was issued by a SCOM server.
    ///
    /// Any inability to read the certificate counts as "not SCOM-signed".
    async fn certificate_signed_by_scom(&self) -> bool {
        let cert = &self.paths.scom_cert;
        if !self.fs.exists(cert) {
            tracing::info!("SCOM cert does not exist");
            return false;
        }
        let which = CommandInvocation::new("which openssl").unchecked().redacted();
        if !matches!(run_command(self.runner, &which).await, Ok(r) if r.success()) {
            tracing::warn!(
                "OpenSSL is not available; SCOM cert could not be checked and is treated as not \
signed by a SCOM server"
            );
            return false;
        }
        let read = CommandInvocation::new(format!("openssl x509 -in {} -noout -text", cert.display()))
            .unchecked()
            .redacted();
        match run_command(self.runner, &read).await {
            Ok(result) if result.success() => {
                let signed = conflict::is_scom_signed(&result.output);
                if signed {
                    tracing::info!("SCOM cert exists and is signed by SCOM server");
                } else {
                    tracing::info!("SCOM cert exists but is not signed by SCOM server");
                }
                signed
            }
            _ => {
                tracing::error!(
                    "Error reading SCOM cert; cert could not be determined to be signed by SCOM \
server"
                );
                false
            }
        }
    }
}
