//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving the console configuration
//! in TOML format with platform-specific directory resolution. The configuration
//! declares the matrix devices (in registry order), the optional command
//! surfaces, and the console rendering options.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calibration::SinkOptions;
use crate::constants::{DEFAULT_IDLE_PROMPT, SETTLE_DELAY};
use crate::device::{DeviceEntry, DeviceRegistry, SimulatedMatrix, SimulatedMatrixConfig};
use crate::shell::{Capabilities, ShellOptions};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "ECMATRIX_CONFIG_DIR";

/// Console rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Idle prompt text
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Pause after the low-sampling instruction, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Print per-position calibration diagnostics instead of progress marks
    #[serde(default)]
    pub verbose_calibration: bool,
    /// Return to the idle prompt when calibration fails mid-run
    #[serde(default = "default_true")]
    pub restore_prompt_on_failure: bool,
}

fn default_prompt() -> String {
    DEFAULT_IDLE_PROMPT.to_string()
}

fn default_settle_delay_ms() -> u64 {
    u64::try_from(SETTLE_DELAY.as_millis()).unwrap_or(1000)
}

fn default_true() -> bool {
    true
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            settle_delay_ms: default_settle_delay_ms(),
            verbose_calibration: false,
            restore_prompt_on_failure: true,
        }
    }
}

/// Optional command surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Enables `calibration save` and `calibration load`
    #[serde(default = "default_true")]
    pub settings: bool,
    /// Enables `scan_rate`
    #[serde(default = "default_true")]
    pub scan_rate: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            settings: true,
            scan_rate: true,
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - `$ECMATRIX_CONFIG_DIR/config.toml` when the variable is set
/// - Linux: `~/.config/ECMatrix/config.toml`
/// - macOS: `~/Library/Application Support/ECMatrix/config.toml`
/// - Windows: `%APPDATA%\ECMatrix\config.toml`
///
/// # Validation
///
/// - device names must be non-empty, free of whitespace, and unique
/// - every matrix needs at least one strobe and one input
/// - fault-injection codes must be negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Console options
    #[serde(default)]
    pub shell: ShellConfig,
    /// Optional commands
    #[serde(default)]
    pub features: FeatureConfig,
    /// Matrix devices, in registry order
    #[serde(default)]
    pub devices: Vec<SimulatedMatrixConfig>,
}

impl Config {
    /// Creates a new Config with default values and a single matrix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shell: ShellConfig::default(),
            features: FeatureConfig::default(),
            devices: vec![SimulatedMatrixConfig::new("ec_matrix0")],
        }
    }

    /// Gets the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("ECMatrix");

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default location.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from an explicit file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate().context(format!(
            "Invalid config file: {}",
            config_path.display()
        ))?;

        Ok(config)
    }

    /// Saves configuration to `config_path` using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        for device in &self.devices {
            if device.strobes == 0 || device.inputs == 0 {
                anyhow::bail!(
                    "Device '{}' must have at least one strobe and one input",
                    device.name
                );
            }

            for (field, code) in [
                ("calibration_error", device.calibration_error),
                ("storage_error", device.storage_error),
            ] {
                if let Some(code) = code {
                    if code >= 0 {
                        anyhow::bail!(
                            "Device '{}': {field} must be a negative code, got {code}",
                            device.name
                        );
                    }
                }
            }
        }

        // Name rules are owned by the registry
        self.build_registry()?;

        Ok(())
    }

    /// Enumerates the configured devices into a registry, in declaration order.
    pub fn build_registry(&self) -> Result<DeviceRegistry> {
        let entries = self
            .devices
            .iter()
            .map(|device| {
                DeviceEntry::new(
                    device.name.clone(),
                    Box::new(SimulatedMatrix::new(device.clone())),
                )
            })
            .collect();

        DeviceRegistry::new(entries).context("Invalid device list")
    }

    /// Shell options derived from this configuration.
    #[must_use]
    pub fn shell_options(&self) -> ShellOptions {
        ShellOptions {
            capabilities: Capabilities {
                settings: self.features.settings,
                scan_rate: self.features.scan_rate,
            },
            sink: SinkOptions {
                settle_delay: Duration::from_millis(self.shell.settle_delay_ms),
                verbose: self.shell.verbose_calibration,
            },
            restore_prompt_on_failure: self.shell.restore_prompt_on_failure,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
