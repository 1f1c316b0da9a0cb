//! Command invocation and result values used by the retry engine.

use crate::domain::error::HandlerError;
use crate::domain::exit_code;

/// A shell command plus how its attempts should be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command: String,
    /// Log a failing exit code at error level.
    pub check_error: bool,
    /// Log the command text alongside its output. Off for commands carrying secrets.
    pub log_verbosely: bool,
}

impl CommandInvocation {
    /// An invocation that checks errors and logs the command text.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            check_error: true,
            log_verbosely: true,
        }
    }

    /// Do not log the command text (it carries a secret).
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.log_verbosely = false;
        self
    }

    /// Do not log a non-zero exit code as an error.
    #[must_use]
    pub fn unchecked(mut self) -> Self {
        self.check_error = false;
        self
    }
}

/// Exit code and trimmed UTF-8 output of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub output: String,
}

impl CommandResult {
    /// Decode raw output bytes, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::OutputNotUtf8` when the bytes are not UTF-8.
    pub fn from_raw(exit_code: i32, raw: Vec<u8>) -> Result<Self, HandlerError> {
        let output = String::from_utf8(raw).map_err(|_| HandlerError::OutputNotUtf8)?;
        Ok(Self {
            exit_code,
            output: output.trim().to_string(),
        })
    }

    /// Result standing in for a command that could not be spawned.
    #[must_use]
    pub fn could_not_execute(reason: &str) -> Self {
        Self {
            exit_code: exit_code::COULD_NOT_EXECUTE,
            output: reason.to_string(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == exit_code::SUCCESS
    }
}

/// What a retry policy decided about the last attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again; `reason` is logged before sleeping.
    Retry { reason: String },
    /// Keep the last result.
    Stop,
}

impl RetryDecision {
    #[must_use]
    pub fn retry(reason: impl Into<String>) -> Self {
        Self::Retry {
            reason: reason.into(),
        }
    }
}
