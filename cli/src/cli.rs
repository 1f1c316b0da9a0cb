//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::app::HandlerContext;
use crate::commands;
use crate::infra::{config::YamlConfigStore, logging};

/// Install, onboard and manage the OMS agent for Linux
#[derive(Parser)]
#[command(name = "omsagent-handler", version)]
pub struct Cli {
    /// Lifecycle operation: install, enable, disable, uninstall or update.
    /// Leading `-` or `/` are accepted (`-enable`, `/install`).
    #[arg(allow_hyphen_values = true, value_name = "OPERATION")]
    pub operation: Option<String>,

    /// Handler configuration file (YAML)
    #[arg(long, env = "OMSAGENT_HANDLER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Run the requested operation and return the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error only if the handler cannot be set up (unreadable
    /// configuration); operation failures are reported as exit codes.
    pub async fn run(self) -> Result<i32> {
        let config = YamlConfigStore::new(self.config).load()?;
        let ctx = HandlerContext::new(config)?;

        logging::init(ctx.environment.log_folder());
        if let Some(e) = &ctx.environment_error {
            tracing::warn!("Using default handler folders: {e}");
        }

        let requested = self.operation.unwrap_or_default();
        Ok(commands::run(&ctx, &requested).await)
    }
}
