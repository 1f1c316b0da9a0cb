//! Shared test helpers: scripted fakes for the application ports.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::{Result, anyhow};
use omsagent_handler::application::ports::{CommandRunner, HostFs, SettingsProvider, Sleeper};
use omsagent_handler::application::services::Host;
use omsagent_handler::domain::{HandlerConfig, HandlerSettings, ProtectedSettings, PublicSettings};

pub const WORKSPACE_ID: &str = "2d8c6c4e-8a0f-4d6b-9a3e-1c2b3d4e5f60";
pub const OTHER_WORKSPACE_ID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";
/// `"workspace-key"` in standard base64.
pub const WORKSPACE_KEY: &str = "d29ya3NwYWNlLWtleQ==";

pub const UBUNTU_1604: &str = "NAME=\"Ubuntu\"\nID=ubuntu\nVERSION_ID=\"16.04\"\n";

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code.
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Command runner ───────────────────────────────────────────────────────────

/// One scripted answer from `FakeRunner`.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Exit with a code and UTF-8 output.
    Exit(i32, String),
    /// Exit with a code and arbitrary output bytes.
    Raw(i32, Vec<u8>),
    /// The shell could not be spawned.
    SpawnError,
}

pub fn exit(code: i32, output: &str) -> Reply {
    Reply::Exit(code, output.to_string())
}

/// `CommandRunner` answering from scripts keyed by a command substring.
///
/// The first script whose needle occurs in the command line answers. Replies
/// are consumed in order and the last one repeats. Unscripted commands exit
/// 127 like a missing binary.
#[derive(Default)]
pub struct FakeRunner {
    scripts: RefCell<Vec<(String, VecDeque<Reply>)>>,
    calls: RefCell<Vec<String>>,
    stdin: RefCell<Vec<Vec<u8>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(self, needle: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.scripts
            .borrow_mut()
            .push((needle.to_string(), replies.into_iter().collect()));
        self
    }

    /// Every command line run, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// How many command lines containing `needle` were run.
    pub fn count(&self, needle: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.contains(needle)).count()
    }

    /// Bytes passed on stdin, one entry per `run_with_stdin` call.
    pub fn stdin_inputs(&self) -> Vec<Vec<u8>> {
        self.stdin.borrow().clone()
    }

    fn answer(&self, command: &str) -> Result<Output> {
        self.calls.borrow_mut().push(command.to_string());
        let mut scripts = self.scripts.borrow_mut();
        let reply = scripts
            .iter_mut()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .and_then(|(_, replies)| {
                if replies.len() > 1 {
                    replies.pop_front()
                } else {
                    replies.front().cloned()
                }
            })
            .unwrap_or_else(|| exit(127, "sh: command not found"));
        match reply {
            Reply::Exit(code, out) => Ok(output(code, out.into_bytes())),
            Reply::Raw(code, bytes) => Ok(output(code, bytes)),
            Reply::SpawnError => Err(anyhow!("failed to spawn /bin/sh")),
        }
    }
}

fn output(code: i32, stdout: Vec<u8>) -> Output {
    Output {
        status: exit_status(code),
        stdout,
        stderr: Vec::new(),
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, command: &str) -> Result<Output> {
        self.answer(command)
    }

    async fn run_with_stdin(&self, command: &str, input: &[u8]) -> Result<Output> {
        self.stdin.borrow_mut().push(input.to_vec());
        self.answer(command)
    }
}

// ── Sleeper ──────────────────────────────────────────────────────────────────

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

// ── Filesystem ───────────────────────────────────────────────────────────────

/// In-memory `HostFs`.
#[derive(Default)]
pub struct FakeFs {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeMap<PathBuf, Vec<String>>,
    existing: BTreeSet<PathBuf>,
    executable: RefCell<Vec<PathBuf>>,
    chmod_fails: bool,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A readable file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        self.existing.insert(path.clone());
        self.files.insert(path, content.to_string());
        self
    }

    /// A path that exists but whose content the test does not care about.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.existing.insert(path.into());
        self
    }

    /// A directory tree below `root`, given as the names of every directory in it.
    #[must_use]
    pub fn with_dirs(mut self, root: impl Into<PathBuf>, names: &[&str]) -> Self {
        let root = root.into();
        self.existing.insert(root.clone());
        self.dirs
            .insert(root, names.iter().map(ToString::to_string).collect());
        self
    }

    #[must_use]
    pub fn with_failing_chmod(mut self) -> Self {
        self.chmod_fails = true;
        self
    }

    pub fn made_executable(&self) -> Vec<PathBuf> {
        self.executable.borrow().clone()
    }
}

impl HostFs for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.existing.contains(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("reading {}: No such file or directory", path.display()))
    }

    fn subdirectory_names(&self, root: &Path) -> Result<Vec<String>> {
        self.dirs
            .get(root)
            .cloned()
            .ok_or_else(|| anyhow!("listing directory {}: No such file or directory", root.display()))
    }

    fn set_owner_executable(&self, path: &Path) -> Result<()> {
        if self.chmod_fails {
            return Err(anyhow!("Operation not permitted"));
        }
        self.executable.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

// ── Settings ─────────────────────────────────────────────────────────────────

/// `SettingsProvider` returning fixed settings.
pub struct FakeSettings(pub HandlerSettings);

impl SettingsProvider for FakeSettings {
    async fn settings(&self) -> Result<HandlerSettings> {
        Ok(self.0.clone())
    }
}

pub fn public(workspace_id: Option<&str>, stop_on_multiple_connections: Option<bool>) -> PublicSettings {
    PublicSettings {
        workspace_id: workspace_id.map(ToString::to_string),
        stop_on_multiple_connections,
    }
}

pub fn protected(workspace_key: Option<&str>) -> ProtectedSettings {
    ProtectedSettings {
        workspace_key: workspace_key.map(ToString::to_string),
        ..ProtectedSettings::default()
    }
}

/// Complete, valid settings for `WORKSPACE_ID`.
pub fn valid_settings(stop_on_multiple_connections: Option<bool>) -> FakeSettings {
    FakeSettings(HandlerSettings {
        public: Some(public(Some(WORKSPACE_ID), stop_on_multiple_connections)),
        protected: Ok(Some(protected(Some(WORKSPACE_KEY)))),
    })
}

// ── Host ─────────────────────────────────────────────────────────────────────

pub const HANDLER_DIR: &str = "/var/lib/waagent/omsagent-handler";

pub fn host<'a>(
    runner: &'a FakeRunner,
    sleeper: &'a RecordingSleeper,
    fs: &'a FakeFs,
    config: &'a HandlerConfig,
) -> Host<'a, FakeRunner, RecordingSleeper, FakeFs> {
    Host {
        runner,
        sleeper,
        fs,
        config,
        handler_dir: Path::new(HANDLER_DIR),
    }
}
