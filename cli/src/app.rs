//! Application context: the per-process state every operation runs against.
//!
//! `HandlerContext` is built once in `Cli::run()` from the loaded
//! configuration and the hosting agent's `HandlerEnvironment.json`, and hands
//! out the production port implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::services::Host;
use crate::domain::HandlerConfig;
use crate::infra::command_runner::{ShellCommandRunner, TokioSleeper};
use crate::infra::fs::StdHostFs;
use crate::infra::handler_env::{HandlerEnvironment, latest_sequence_number};
use crate::infra::settings::FileSettingsProvider;
use crate::infra::status::StatusFileSink;

/// Unified handler context passed to the command dispatcher.
pub struct HandlerContext {
    pub config: HandlerConfig,
    /// Directory holding `HandlerEnvironment.json` and `packages/`.
    pub handler_dir: PathBuf,
    pub environment: HandlerEnvironment,
    /// Why `HandlerEnvironment.json` could not be used, if it could not.
    ///
    /// Kept until logging is initialised so the failure lands in the log.
    pub environment_error: Option<String>,
    /// Sequence number of the settings file this invocation acts on.
    pub sequence_number: u64,
    pub runner: ShellCommandRunner,
    pub sleeper: TokioSleeper,
    pub fs: StdHostFs,
}

impl HandlerContext {
    /// Resolve the handler directory and read the hosting agent's environment.
    ///
    /// A missing or malformed `HandlerEnvironment.json` is not fatal: folders
    /// fall back to their defaults under the handler directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no handler directory is configured and the current
    /// directory cannot be determined.
    pub fn new(config: HandlerConfig) -> Result<Self> {
        let handler_dir = match &config.handler_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine handler directory")?,
        };
        let (environment, environment_error) = match HandlerEnvironment::load(&handler_dir) {
            Ok(env) => (env, None),
            Err(e) => (HandlerEnvironment::default(), Some(format!("{e:#}"))),
        };
        let sequence_number = latest_sequence_number(&environment.config_folder(&handler_dir));

        Ok(Self {
            config,
            handler_dir,
            environment,
            environment_error,
            sequence_number,
            runner: ShellCommandRunner,
            sleeper: TokioSleeper,
            fs: StdHostFs,
        })
    }

    /// Ports and configuration for the lifecycle services.
    #[must_use]
    pub fn host(&self) -> Host<'_, ShellCommandRunner, TokioSleeper, StdHostFs> {
        Host {
            runner: &self.runner,
            sleeper: &self.sleeper,
            fs: &self.fs,
            config: &self.config,
            handler_dir: &self.handler_dir,
        }
    }

    /// Path of `<configFolder>/<seq>.settings`.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.environment
            .config_folder(&self.handler_dir)
            .join(format!("{}.settings", self.sequence_number))
    }

    #[must_use]
    pub fn settings_provider(&self) -> FileSettingsProvider<'_, ShellCommandRunner> {
        FileSettingsProvider::new(
            &self.runner,
            self.settings_path(),
            self.config.paths.waagent_lib_dir.clone(),
        )
    }

    #[must_use]
    pub fn status_sink(&self) -> StatusFileSink {
        StatusFileSink::new(
            self.environment.status_folder(&self.handler_dir),
            self.sequence_number,
            self.environment.version(),
        )
    }
}
