//! Handler configuration: every host path and constant the handler touches.
//!
//! Pure types only: loading from disk lives in `crate::infra::config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::conflict::SCOM_PORT;

/// Shell bundle shipped in `<handler_dir>/packages/`.
pub const DEFAULT_BUNDLE: &str = "omsagent-1.4.1-45.universal.x64.sh";

/// Onboarding endpoint domain for the sovereign cloud this handler targets.
pub const DEFAULT_ONBOARDING_DOMAIN: &str = "opinsights.azure.us";

/// Handler configuration, optionally overridden from a YAML file.
///
/// Every field defaults to the production location, so an empty file (or no
/// file) yields the production configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerConfig {
    /// Directory holding `HandlerEnvironment.json` and `packages/`.
    /// `None` means the process working directory.
    pub handler_dir: Option<PathBuf>,
    pub bundle_file_name: String,
    pub onboarding_domain: String,
    pub scom_port: u16,
    pub paths: HostPaths,
}

/// Locations of agent scripts, config files and certificates on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostPaths {
    pub omsadmin: PathBuf,
    pub service_control: PathBuf,
    pub omi_config_editor: PathBuf,
    pub omi_server_conf: PathBuf,
    pub agent_config_root: PathBuf,
    pub scom_cert: PathBuf,
    /// Where the hosting agent keeps the certificate pairs protecting settings.
    pub waagent_lib_dir: PathBuf,
    pub os_release: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            handler_dir: None,
            bundle_file_name: DEFAULT_BUNDLE.to_string(),
            onboarding_domain: DEFAULT_ONBOARDING_DOMAIN.to_string(),
            scom_port: SCOM_PORT,
            paths: HostPaths::default(),
        }
    }
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            omsadmin: PathBuf::from("/opt/microsoft/omsagent/bin/omsadmin.sh"),
            service_control: PathBuf::from("/opt/microsoft/omsagent/bin/service_control"),
            omi_config_editor: PathBuf::from("/opt/omi/bin/omiconfigeditor"),
            omi_server_conf: PathBuf::from("/etc/opt/omi/conf/omiserver.conf"),
            agent_config_root: PathBuf::from("/etc/opt/microsoft/omsagent/"),
            scom_cert: PathBuf::from("/etc/opt/microsoft/scx/ssl/scx.pem"),
            waagent_lib_dir: PathBuf::from("/var/lib/waagent"),
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

impl HandlerConfig {
    /// Path of the agent bundle under `handler_dir`.
    #[must_use]
    pub fn bundle_path(&self, handler_dir: &std::path::Path) -> PathBuf {
        handler_dir.join("packages").join(&self.bundle_file_name)
    }
}
