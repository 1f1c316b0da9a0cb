//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, the hosting agent's files, and logging setup.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::cli` are forbidden.

pub mod command_runner;
pub mod config;
pub mod fs;
pub mod handler_env;
pub mod logging;
pub mod settings;
pub mod status;
