//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::cli`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{HandlerSettings, StatusReport};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts shell command execution so infrastructure can be swapped or mocked.
///
/// A non-zero exit is a normal result, never an `Err`. Implementations merge
/// stderr into stdout so callers see output in the order it was written.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a shell command line and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error only if the shell cannot be spawned or waited on.
    async fn run(&self, command: &str) -> Result<Output>;

    /// Run a shell command line with stdin piped from `input`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the shell cannot be spawned or waited on.
    async fn run_with_stdin(&self, command: &str, input: &[u8]) -> Result<Output>;
}

// ── Sleeper Port ──────────────────────────────────────────────────────────────

/// Abstracts waiting between retries so tests can observe durations instead of
/// spending them.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts the host filesystem reads the handler relies on.
pub trait HostFs {
    /// Whether `path` exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Read a UTF-8 text file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Names of every directory below `root`, at any depth.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` cannot be listed.
    fn subdirectory_names(&self, root: &Path) -> Result<Vec<String>>;

    /// Restrict `path` to owner read/write/execute.
    ///
    /// # Errors
    ///
    /// Returns an error if permissions cannot be changed.
    fn set_owner_executable(&self, path: &Path) -> Result<()>;
}

// ── Settings Port ─────────────────────────────────────────────────────────────

/// Supplies the already-decoded settings for the current operation.
#[allow(async_fn_in_trait)]
pub trait SettingsProvider {
    /// # Errors
    ///
    /// Returns an error if settings exist but cannot be loaded or decrypted.
    async fn settings(&self) -> Result<HandlerSettings>;
}

// ── Status Reporting Port ─────────────────────────────────────────────────────

/// Receives the externally visible outcome of an operation, once.
#[cfg_attr(test, mockall::automock)]
pub trait StatusSink {
    /// # Errors
    ///
    /// Returns an error if the status cannot be persisted.
    fn report(&self, report: &StatusReport) -> Result<()>;
}
