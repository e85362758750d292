//! Devices command for listing the device registry.

use crate::cli::common::{CliError, CliResult};
use crate::config::Config;
use clap::Args;
use serde::Serialize;

/// List the matrix devices available to the console
#[derive(Debug, Clone, Args)]
pub struct DevicesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response for the devices command
#[derive(Debug, Serialize)]
struct DevicesResponse {
    devices: Vec<DeviceData>,
    count: usize,
    commands: Vec<&'static str>,
}

/// One registry entry for JSON output
#[derive(Debug, Serialize)]
struct DeviceData {
    index: usize,
    name: String,
    strobes: Option<u8>,
    inputs: Option<u8>,
}

impl DevicesArgs {
    /// Execute the devices command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let registry = config
            .build_registry()
            .map_err(|e| CliError::validation(format!("{e:#}")))?;

        let devices: Vec<DeviceData> = registry
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let size = entry.device().matrix_size();
                DeviceData {
                    index,
                    name: entry.name().to_string(),
                    strobes: size.map(|(strobes, _)| strobes),
                    inputs: size.map(|(_, inputs)| inputs),
                }
            })
            .collect();

        let mut commands = vec!["calibration start"];
        if config.features.settings {
            commands.extend(["calibration save", "calibration load"]);
        }
        if config.features.scan_rate {
            commands.push("scan_rate");
        }

        if self.json {
            let response = DevicesResponse {
                count: devices.len(),
                devices,
                commands,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&response)
                    .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?
            );
            return Ok(());
        }

        if registry.is_empty() {
            println!("No matrix devices configured");
            return Ok(());
        }

        println!("Matrix devices ({}):", devices.len());
        for device in &devices {
            match (device.strobes, device.inputs) {
                (Some(strobes), Some(inputs)) => {
                    println!("  {} ({strobes}x{inputs})", device.name);
                }
                _ => println!("  {}", device.name),
            }
        }
        println!();
        println!("Commands per device: {}", commands.join(", "));

        Ok(())
    }
}
