//! Application-wide constants.
//!
//! This module defines the application name, the console command names and their
//! help texts, and the fixed timing values used by the calibration workflow.

use std::time::Duration;

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "EC Matrix Console";

/// Name of the root console command that owns the per-device subcommands.
pub const ROOT_COMMAND: &str = "ec";

/// Prompt shown while a calibration phase is running.
pub const BUSY_PROMPT: &str = "-";

/// Prompt shown while the console is idle, unless overridden by configuration.
pub const DEFAULT_IDLE_PROMPT: &str = "uart:~$ ";

/// Pause after the low-sampling instruction so the operator can read it.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Help text of the root command.
pub const HELP_ROOT: &str = "EC Matrix commands";
/// Help text of each per-device command.
pub const HELP_DEVICE: &str = "Select subcommand for matrix property label.";
/// Help text of `scan_rate`.
pub const HELP_SCAN_RATE: &str = "Print EC Scan Rate.";
/// Help text of the `calibration` group.
pub const HELP_CALIBRATION: &str = "EC Calibration Utilities.";
/// Help text of `calibration start`.
pub const HELP_CALIBRATION_START: &str = "Calibrate the EC Matrix.";
/// Help text of `calibration save`.
pub const HELP_CALIBRATION_SAVE: &str = "Save the EC Matrix Calibration To Flash.";
/// Help text of `calibration load`.
pub const HELP_CALIBRATION_LOAD: &str = "Load the EC Matrix Calibration From Flash.";

/// Errno-style codes returned by the simulated driver.
pub mod errno {
    /// No stored calibration to load
    pub const ENOENT: i32 = 2;
    /// The line names no command
    pub const ENOEXEC: i32 = 8;
    /// A calibration is already running
    pub const EBUSY: i32 = 16;
    /// The matrix has no positions
    pub const EINVAL: i32 = 22;
    /// No calibration to save
    pub const ENODATA: i32 = 61;
}
