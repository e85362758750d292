//! In-process EC matrix driver.
//!
//! Stands in for the hardware scanning driver and the settings store when no real
//! matrix is attached. Calibration walks every strobe/input position and reports
//! the same ordered event stream a hardware driver produces, with deterministic
//! synthetic readings. Saved calibrations live in a one-slot store that survives
//! for the life of the process.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{MatrixDevice, OperationResult};
use crate::calibration::{CalibrationEvent, CalibrationSink, MatrixPosition};
use crate::constants::errno;

/// Per-device settings of the simulated driver, as written in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedMatrixConfig {
    /// Device name advertised on the console
    pub name: String,
    /// Number of strobe lines
    #[serde(default = "default_strobes")]
    pub strobes: u8,
    /// Number of input lines
    #[serde(default = "default_inputs")]
    pub inputs: u8,
    /// Longest observed scan duration (0 = unknown)
    #[serde(default)]
    pub max_scan_duration_ns: u64,
    /// Whether the settings store already holds a calibration at startup
    #[serde(default)]
    pub has_stored_calibration: bool,
    /// Forces calibration to fail with this code after the quiet phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_error: Option<i32>,
    /// Forces save and load to fail with this code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<i32>,
}

fn default_strobes() -> u8 {
    4
}

fn default_inputs() -> u8 {
    6
}

impl SimulatedMatrixConfig {
    /// Creates a device description with default matrix size and no faults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strobes: default_strobes(),
            inputs: default_inputs(),
            max_scan_duration_ns: 0,
            has_stored_calibration: false,
            calibration_error: None,
            storage_error: None,
        }
    }
}

/// Calibrated thresholds of one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionCalibration {
    /// Calibrated position
    pub position: MatrixPosition,
    /// Average reading while released
    pub low_avg: u16,
    /// Average reading while pressed
    pub high_avg: u16,
    /// Peak deviation while released
    pub noise: u16,
}

impl PositionCalibration {
    /// Signal-to-noise ratio of the position.
    #[must_use]
    pub fn snr(&self) -> u16 {
        (self.high_avg.saturating_sub(self.low_avg)) / self.noise.max(1)
    }
}

#[derive(Debug, Default)]
struct MatrixState {
    running: bool,
    active: Option<Vec<PositionCalibration>>,
    stored: Option<Vec<PositionCalibration>>,
}

/// Clears the running flag when a calibration returns or unwinds.
struct RunningGuard<'a>(&'a RefCell<MatrixState>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().running = false;
    }
}

/// Simulated EC matrix.
#[derive(Debug)]
pub struct SimulatedMatrix {
    config: SimulatedMatrixConfig,
    state: RefCell<MatrixState>,
}

impl SimulatedMatrix {
    /// Builds the device, preloading the store when configured to.
    #[must_use]
    pub fn new(config: SimulatedMatrixConfig) -> Self {
        let stored = config
            .has_stored_calibration
            .then(|| synthesize(config.strobes, config.inputs));
        Self {
            config,
            state: RefCell::new(MatrixState {
                stored,
                ..MatrixState::default()
            }),
        }
    }

    /// Calibration currently applied to the scanner, if any.
    #[must_use]
    pub fn active_calibration(&self) -> Option<Vec<PositionCalibration>> {
        self.state.borrow().active.clone()
    }

    /// Calibration held by the settings store, if any.
    #[must_use]
    pub fn stored_calibration(&self) -> Option<Vec<PositionCalibration>> {
        self.state.borrow().stored.clone()
    }
}

/// Deterministic readings for every position of a `strobes x inputs` matrix.
fn synthesize(strobes: u8, inputs: u8) -> Vec<PositionCalibration> {
    let mut readings = Vec::with_capacity(usize::from(strobes) * usize::from(inputs));
    for strobe in 0..strobes {
        for input in 0..inputs {
            let seed = u16::from(strobe) * 7 + u16::from(input) * 3;
            readings.push(PositionCalibration {
                position: MatrixPosition::new(strobe, input),
                low_avg: 200 + seed % 17,
                high_avg: 900 + seed % 53,
                noise: 2 + seed % 4,
            });
        }
    }
    readings
}

impl MatrixDevice for SimulatedMatrix {
    fn calibrate(&self, sink: &mut dyn CalibrationSink) -> OperationResult {
        {
            let mut state = self.state.borrow_mut();
            if state.running {
                return OperationResult::rejected(errno::EBUSY);
            }
            state.running = true;
        }

        let _running = RunningGuard(&self.state);
        self.run_calibration(sink)
    }

    fn save_calibration(&self) -> OperationResult {
        if let Some(code) = self.config.storage_error {
            warn!(device = %self.config.name, code, "settings store rejected save");
            return OperationResult(code);
        }

        let mut state = self.state.borrow_mut();
        match state.active.clone() {
            Some(calibration) => {
                info!(device = %self.config.name, positions = calibration.len(), "calibration saved");
                state.stored = Some(calibration);
                OperationResult::OK
            }
            None => OperationResult::rejected(errno::ENODATA),
        }
    }

    fn load_calibration(&self) -> OperationResult {
        if let Some(code) = self.config.storage_error {
            warn!(device = %self.config.name, code, "settings store rejected load");
            return OperationResult(code);
        }

        let mut state = self.state.borrow_mut();
        match state.stored.clone() {
            Some(calibration) => {
                info!(device = %self.config.name, positions = calibration.len(), "calibration loaded");
                state.active = Some(calibration);
                OperationResult::OK
            }
            None => OperationResult::rejected(errno::ENOENT),
        }
    }

    fn max_scan_duration_ns(&self) -> u64 {
        self.config.max_scan_duration_ns
    }

    fn matrix_size(&self) -> Option<(u8, u8)> {
        Some((self.config.strobes, self.config.inputs))
    }
}

impl SimulatedMatrix {
    fn run_calibration(&self, sink: &mut dyn CalibrationSink) -> OperationResult {
        if self.config.strobes == 0 || self.config.inputs == 0 {
            return OperationResult::rejected(errno::EINVAL);
        }

        let readings = synthesize(self.config.strobes, self.config.inputs);

        sink.on_event(&CalibrationEvent::LowSamplingStart);
        if let Some(code) = self.config.calibration_error {
            warn!(device = %self.config.name, code, "calibration aborted");
            return OperationResult(code);
        }

        for reading in &readings {
            sink.on_event(&CalibrationEvent::PositionLowDetermined {
                position: reading.position,
                low_avg: reading.low_avg,
                noise: reading.noise,
            });
        }

        sink.on_event(&CalibrationEvent::HighSamplingStart);
        for reading in &readings {
            sink.on_event(&CalibrationEvent::PositionComplete {
                position: reading.position,
                low_avg: reading.low_avg,
                high_avg: reading.high_avg,
                noise: reading.noise,
                snr: reading.snr(),
            });
        }

        sink.on_event(&CalibrationEvent::Complete);
        self.state.borrow_mut().active = Some(readings);
        OperationResult::OK
    }
}
