//! Handlers of the per-device commands.
//!
//! Each handler resolves its device from the [`Invocation`], calls the driver, and
//! turns the [`OperationResult`] into console text and a status. Accepted results
//! (zero or positive) are returned unchanged; rejected ones are echoed in a one-line
//! diagnostic and returned as the status.

use tracing::{info, warn};

use super::Invocation;
use crate::calibration::ConsoleCalibrationSink;
use crate::console::{Console, Prompt};
use crate::device::OperationResult;

/// `ec <device> calibration start`
pub fn calibration_start(console: &mut dyn Console, invocation: &Invocation<'_>) -> i32 {
    let entry = invocation.device();
    let options = invocation.options();
    info!(device = entry.name(), "starting calibration");

    let result = {
        let mut sink = ConsoleCalibrationSink::new(&mut *console, options.sink);
        entry.device().calibrate(&mut sink)
    };

    if result.is_rejected() {
        warn!(device = entry.name(), code = result.code(), "calibration rejected");
        console.error(&format!("Failed to start calibration ({result})"));
        if options.restore_prompt_on_failure && console.prompt() == Prompt::Busy {
            console.set_prompt(Prompt::Idle);
        }
    } else {
        info!(device = entry.name(), code = result.code(), "calibration finished");
    }

    result.code()
}

/// `ec <device> calibration save`
pub fn calibration_save(console: &mut dyn Console, invocation: &Invocation<'_>) -> i32 {
    let entry = invocation.device();
    let result = entry.device().save_calibration();
    report(console, entry.name(), "save", result)
}

/// `ec <device> calibration load`
pub fn calibration_load(console: &mut dyn Console, invocation: &Invocation<'_>) -> i32 {
    let entry = invocation.device();
    let result = entry.device().load_calibration();
    report(console, entry.name(), "load", result)
}

/// `ec <device> scan_rate`
///
/// Prints nothing when the driver has no timing data yet.
pub fn scan_rate(console: &mut dyn Console, invocation: &Invocation<'_>) -> i32 {
    let entry = invocation.device();
    let duration_ns = entry.device().max_scan_duration_ns();

    if let Some(rate) = scan_rate_hz(duration_ns) {
        console.info(&format!("Matrix scan rate: {rate}Hz"));
    }

    0
}

/// Scan rate for a scan duration, truncated to whole hertz.
#[must_use]
pub fn scan_rate_hz(duration_ns: u64) -> Option<u64> {
    1_000_000_000u64.checked_div(duration_ns)
}

fn report(console: &mut dyn Console, device: &str, action: &str, result: OperationResult) -> i32 {
    if result.is_rejected() {
        warn!(device, action, code = result.code(), "calibration storage rejected");
        console.error(&format!("Failed to initiate {action} calibration ({result})"));
    } else {
        info!(device, action, code = result.code(), "calibration storage accepted");
    }

    result.code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationEvent, CalibrationSink};
    use crate::console::RecordingConsole;
    use crate::device::{DeviceEntry, DeviceRegistry, MatrixDevice};
    use crate::shell::{Shell, ShellOptions};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct Script {
        calibrate: i32,
        storage: i32,
        scan_ns: u64,
        saves: Rc<Cell<u32>>,
    }

    impl MatrixDevice for Script {
        fn calibrate(&self, sink: &mut dyn CalibrationSink) -> OperationResult {
            sink.on_event(&CalibrationEvent::LowSamplingStart);
            if self.calibrate < 0 {
                return OperationResult(self.calibrate);
            }
            sink.on_event(&CalibrationEvent::HighSamplingStart);
            sink.on_event(&CalibrationEvent::Complete);
            OperationResult(self.calibrate)
        }

        fn save_calibration(&self) -> OperationResult {
            self.saves.set(self.saves.get() + 1);
            OperationResult(self.storage)
        }

        fn load_calibration(&self) -> OperationResult {
            OperationResult(self.storage)
        }

        fn max_scan_duration_ns(&self) -> u64 {
            self.scan_ns
        }
    }

    fn shell_with(script: Script, restore_prompt_on_failure: bool) -> Shell {
        let registry =
            DeviceRegistry::new(vec![DeviceEntry::new("adc0", Box::new(script))]).unwrap();
        let mut options = ShellOptions::default();
        options.sink.settle_delay = Duration::ZERO;
        options.restore_prompt_on_failure = restore_prompt_on_failure;
        Shell::new(registry, options)
    }

    #[test]
    fn test_scan_rate_hz_truncates() {
        assert_eq!(scan_rate_hz(1_000_000), Some(1000));
        assert_eq!(scan_rate_hz(3), Some(333_333_333));
        assert_eq!(scan_rate_hz(1_500_000_000), Some(0));
        assert_eq!(scan_rate_hz(0), None);
    }

    #[test]
    fn test_scan_rate_prints_hz() {
        let shell = shell_with(
            Script {
                scan_ns: 1_000_000,
                ..Script::default()
            },
            true,
        );
        let mut console = RecordingConsole::new();

        assert_eq!(shell.execute(&mut console, &["ec", "adc0", "scan_rate"]), 0);
        assert_eq!(console.output(), "Matrix scan rate: 1000Hz\n");
    }

    #[test]
    fn test_scan_rate_without_timing_is_silent() {
        let shell = shell_with(Script::default(), true);
        let mut console = RecordingConsole::new();

        assert_eq!(shell.execute(&mut console, &["ec", "adc0", "scan_rate"]), 0);
        assert!(console.ops().is_empty());
    }

    #[test]
    fn test_start_rejection_reports_code() {
        let shell = shell_with(
            Script {
                calibrate: -5,
                ..Script::default()
            },
            true,
        );
        let mut console = RecordingConsole::new();

        let status = shell.execute(&mut console, &["ec", "adc0", "calibration", "start"]);
        assert_eq!(status, -5);
        assert_eq!(console.errors(), vec!["Failed to start calibration (-5)"]);
        assert_eq!(console.prompt(), Prompt::Idle);
    }

    #[test]
    fn test_start_rejection_with_most_negative_code() {
        let shell = shell_with(
            Script {
                calibrate: i32::MIN,
                ..Script::default()
            },
            true,
        );
        let mut console = RecordingConsole::new();

        let status = shell.execute(&mut console, &["ec", "adc0", "calibration", "start"]);
        assert_eq!(status, i32::MIN);
        assert_eq!(
            console.errors(),
            vec!["Failed to start calibration (-2147483648)"]
        );
    }

    #[test]
    fn test_start_rejection_can_keep_busy_prompt() {
        let shell = shell_with(
            Script {
                calibrate: -5,
                ..Script::default()
            },
            false,
        );
        let mut console = RecordingConsole::new();

        shell.execute(&mut console, &["ec", "adc0", "calibration", "start"]);
        assert_eq!(console.prompt(), Prompt::Busy);
    }

    #[test]
    fn test_start_success_returns_driver_code() {
        let shell = shell_with(
            Script {
                calibrate: 2,
                ..Script::default()
            },
            true,
        );
        let mut console = RecordingConsole::new();

        assert_eq!(
            shell.execute(&mut console, &["ec", "adc0", "calibration", "start"]),
            2
        );
        assert!(console.errors().is_empty());
        assert_eq!(console.prompt_changes(), vec![Prompt::Busy, Prompt::Idle]);
    }

    #[test]
    fn test_save_twice_reports_each_attempt() {
        let saves = Rc::new(Cell::new(0));
        let shell = shell_with(
            Script {
                storage: -28,
                saves: Rc::clone(&saves),
                ..Script::default()
            },
            true,
        );
        let mut console = RecordingConsole::new();

        let line = ["ec", "adc0", "calibration", "save"];
        assert_eq!(shell.execute(&mut console, &line), -28);
        assert_eq!(shell.execute(&mut console, &line), -28);
        assert_eq!(saves.get(), 2);
        assert_eq!(
            console.errors(),
            vec![
                "Failed to initiate save calibration (-28)",
                "Failed to initiate save calibration (-28)"
            ]
        );
    }

    #[test]
    fn test_load_success_is_silent() {
        let shell = shell_with(Script::default(), true);
        let mut console = RecordingConsole::new();

        assert_eq!(
            shell.execute(&mut console, &["ec", "adc0", "calibration", "load"]),
            0
        );
        assert!(console.ops().is_empty());
    }
}
