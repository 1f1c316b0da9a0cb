//! Infrastructure implementation of the `CommandRunner` and `Sleeper` ports.
//!
//! `ShellCommandRunner` runs command lines through `sh -c` with stderr merged
//! into stdout, using tokio for process execution. There is no timeout: the
//! hosting agent enforces its own per-operation limit and kills the handler.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::application::ports::{CommandRunner, Sleeper};

/// Shell used to interpret command lines.
pub const SHELL: &str = "/bin/sh";

/// Production `CommandRunner`.
#[derive(Debug, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    fn command(command_line: &str) -> tokio::process::Command {
        // Merge stderr into stdout for the whole script, keeping write order.
        let script = format!("exec 2>&1\n{command_line}");
        let mut cmd = tokio::process::Command::new(SHELL);
        cmd.arg("-c")
            .arg(script)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str) -> Result<Output> {
        Self::command(command)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to spawn {SHELL}"))
    }

    async fn run_with_stdin(&self, command: &str, input: &[u8]) -> Result<Output> {
        let mut child = Self::command(command)
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {SHELL}"))?;

        let stdin_handle = child.stdin.take();
        let input_owned = input.to_vec();
        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        // Feed stdin while draining stdout/stderr so neither pipe can fill up.
        let (status, (), stdout, stderr) = tokio::join!(
            child.wait(),
            async move {
                if let Some(mut stdin) = stdin_handle {
                    if let Err(e) = stdin.write_all(&input_owned).await {
                        tracing::debug!("child closed stdin before reading all input: {e}");
                    }
                }
            },
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stdout_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stderr_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
        );

        Ok(Output {
            status: status.with_context(|| format!("waiting for {SHELL}"))?,
            stdout,
            stderr,
        })
    }
}

/// Production `Sleeper` backed by the tokio timer.
#[derive(Debug, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
