//! CLI command handlers for ECMatrix.
//!
//! This module provides the outer command line: listing devices, running a single
//! console command for scripting, and the interactive console session.

pub mod common;
pub mod devices;
pub mod exec;
pub mod shell;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use devices::DevicesArgs;
pub use exec::ExecArgs;
pub use shell::ShellArgs;
