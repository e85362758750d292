//! Shared test fixtures for E2E CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use ecmatrix::config::Config;
use ecmatrix::device::SimulatedMatrixConfig;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Path to the ecmatrix binary
pub fn ecmatrix_bin() -> &'static str {
    env!("CARGO_BIN_EXE_ecmatrix")
}

/// A device with a small matrix and no injected faults.
pub fn device(name: &str) -> SimulatedMatrixConfig {
    let mut device = SimulatedMatrixConfig::new(name);
    device.strobes = 2;
    device.inputs = 3;
    device
}

/// Config with the given devices, all features on, and no settle delay.
pub fn test_config(devices: Vec<SimulatedMatrixConfig>) -> Config {
    let mut config = Config::new();
    config.shell.settle_delay_ms = 0;
    config.devices = devices;
    config
}

/// Writes `config` to a temporary config.toml.
///
/// # Returns
/// The file path and the TempDir that must be kept alive while the file is used.
pub fn create_temp_config_file(config: &Config) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    config
        .save_to(&config_path)
        .expect("Failed to write config file");
    (config_path, temp_dir)
}

/// Command for the binary bound to a config file, with colours disabled by args.
pub fn ecmatrix_command(config_path: &PathBuf) -> Command {
    let mut cmd = Command::new(ecmatrix_bin());
    cmd.arg("--config").arg(config_path);
    cmd.env_remove("RUST_LOG");
    cmd
}
