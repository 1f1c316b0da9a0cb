//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod command;
pub mod config;
pub mod conflict;
pub mod distro;
pub mod error;
pub mod exit_code;
pub mod operation;
pub mod settings;
pub mod status;

pub use command::{CommandInvocation, CommandResult, RetryDecision};
pub use config::{HandlerConfig, HostPaths};
pub use conflict::{ConflictReason, ConflictVerdict, ProbeOutcome};
pub use distro::HostDistro;
pub use error::HandlerError;
pub use operation::Operation;
pub use settings::{HandlerSettings, ProtectedSettings, PublicSettings};
pub use status::{StatusReport, StatusState};
