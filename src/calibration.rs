//! Calibration progress events and their console rendering.
//!
//! A matrix driver reports a calibration run as a strictly ordered stream of
//! [`CalibrationEvent`]s delivered synchronously on the calling thread:
//!
//! 1. one [`CalibrationEvent::LowSamplingStart`]
//! 2. one [`CalibrationEvent::PositionLowDetermined`] per matrix position
//! 3. one [`CalibrationEvent::HighSamplingStart`]
//! 4. one [`CalibrationEvent::PositionComplete`] per matrix position
//! 5. one [`CalibrationEvent::Complete`]
//!
//! [`ConsoleCalibrationSink`] turns that stream into operator instructions, a
//! progress bar of asterisks, and prompt changes.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::console::{Console, Prompt};
use crate::constants::SETTLE_DELAY;

/// Strobe/input coordinate of one key position in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixPosition {
    /// Strobe (row) line
    pub strobe: u8,
    /// Input (column) line
    pub input: u8,
}

impl MatrixPosition {
    /// Position at `strobe`, `input`.
    #[must_use]
    pub const fn new(strobe: u8, input: u8) -> Self {
        Self { strobe, input }
    }
}

/// One moment of an in-progress calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationEvent {
    /// Quiet phase begins; no key may be pressed
    LowSamplingStart,
    /// Active phase begins; keys are pressed and released one by one
    HighSamplingStart,
    /// Baseline of one position has been established
    PositionLowDetermined {
        /// Calibrated position
        position: MatrixPosition,
        /// Average reading while released
        low_avg: u16,
        /// Peak deviation while released
        noise: u16,
    },
    /// One position is fully calibrated
    PositionComplete {
        /// Calibrated position
        position: MatrixPosition,
        /// Average reading while released
        low_avg: u16,
        /// Average reading while pressed
        high_avg: u16,
        /// Peak deviation while released
        noise: u16,
        /// Signal-to-noise ratio
        snr: u16,
    },
    /// The whole matrix is calibrated
    Complete,
}

/// Receiver of calibration events.
///
/// Events are only valid for the duration of the call.
pub trait CalibrationSink {
    /// Handles one event on the calibrating thread.
    fn on_event(&mut self, event: &CalibrationEvent);
}

impl<F: FnMut(&CalibrationEvent)> CalibrationSink for F {
    fn on_event(&mut self, event: &CalibrationEvent) {
        self(event);
    }
}

/// Rendering options for [`ConsoleCalibrationSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkOptions {
    /// Pause after the low-sampling instruction
    pub settle_delay: Duration,
    /// Print per-position diagnostics instead of progress asterisks
    pub verbose: bool,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            verbose: false,
        }
    }
}

/// Instruction printed when the quiet phase begins.
pub const LOW_SAMPLING_MESSAGE: &str = "Low value sampling begins. Please do not press any keys";
/// Instruction printed when the active phase begins.
pub const HIGH_SAMPLING_MESSAGE: &str = "\nHigh value sampling begins. Please slowly press each key in sequence, releasing once an asterisk appears";
/// Printed once the whole matrix is calibrated.
pub const COMPLETE_MESSAGE: &str = "\nCalibration complete!";
/// Written, without a newline, for every calibrated position.
pub const PROGRESS_MARK: &str = "*";

/// Calibration sink that writes to a borrowed console.
pub struct ConsoleCalibrationSink<'a> {
    console: &'a mut dyn Console,
    options: SinkOptions,
}

impl<'a> ConsoleCalibrationSink<'a> {
    /// Sink rendering to `console` until it is dropped.
    pub fn new(console: &'a mut dyn Console, options: SinkOptions) -> Self {
        Self { console, options }
    }

    // A run that is already busy keeps its prompt; only real transitions are emitted.
    fn enter_busy(&mut self) {
        if self.console.prompt() != Prompt::Busy {
            self.console.set_prompt(Prompt::Busy);
        }
    }
}

impl CalibrationSink for ConsoleCalibrationSink<'_> {
    fn on_event(&mut self, event: &CalibrationEvent) {
        match *event {
            CalibrationEvent::LowSamplingStart => {
                debug!("low value sampling started");
                self.enter_busy();
                self.console.print(LOW_SAMPLING_MESSAGE);
                if !self.options.settle_delay.is_zero() {
                    thread::sleep(self.options.settle_delay);
                }
            }
            CalibrationEvent::HighSamplingStart => {
                debug!("high value sampling started");
                self.enter_busy();
                self.console.print(HIGH_SAMPLING_MESSAGE);
            }
            CalibrationEvent::PositionLowDetermined {
                position,
                low_avg,
                noise,
            } => {
                debug!(
                    strobe = position.strobe,
                    input = position.input,
                    low_avg,
                    noise,
                    "position low determined"
                );
                if self.options.verbose {
                    self.console.print(&format!(
                        "Key at ({},{}) is calibrated with avg low {low_avg}, noise: {noise}",
                        position.strobe, position.input
                    ));
                } else {
                    self.console.write(PROGRESS_MARK);
                }
            }
            CalibrationEvent::PositionComplete {
                position,
                low_avg,
                high_avg,
                noise,
                snr,
            } => {
                debug!(
                    strobe = position.strobe,
                    input = position.input,
                    low_avg,
                    high_avg,
                    noise,
                    snr,
                    "position complete"
                );
                if self.options.verbose {
                    self.console.print(&format!(
                        "Key at ({},{}) is calibrated with avg low {low_avg}, avg high {high_avg}, noise: {noise}, SNR: {snr}",
                        position.strobe, position.input
                    ));
                } else {
                    self.console.write(PROGRESS_MARK);
                }
            }
            CalibrationEvent::Complete => {
                debug!("calibration complete");
                self.console.set_prompt(Prompt::Idle);
                self.console.print(COMPLETE_MESSAGE);
            }
        }
    }
}
