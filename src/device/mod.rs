//! Matrix devices and the startup device registry.
//!
//! The registry is built once from configuration, in declaration order, and never
//! changes afterwards. Every console command that targets a device resolves it here
//! by the name the command tree advertised.

pub mod simulated;

use std::fmt;

use thiserror::Error;

use crate::calibration::CalibrationSink;

pub use simulated::{SimulatedMatrix, SimulatedMatrixConfig};

/// Signed result code of a driver operation.
///
/// Zero or positive means the operation was accepted, negative means it was
/// rejected for a driver-specific reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OperationResult(pub i32);

impl OperationResult {
    /// Accepted with no further information.
    pub const OK: Self = Self(0);

    /// Creates a rejection from an errno-style code.
    ///
    /// Positive codes are negated; negative codes are kept as they are.
    #[must_use]
    pub const fn rejected(errno: i32) -> Self {
        if errno < 0 {
            Self(errno)
        } else {
            Self(-errno)
        }
    }

    /// Zero or positive.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        self.0 >= 0
    }

    /// Negative.
    #[must_use]
    pub const fn is_rejected(self) -> bool {
        self.0 < 0
    }

    /// Raw signed code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operations the external scanning driver and settings store offer per device.
pub trait MatrixDevice {
    /// Runs a full calibration, delivering events to `sink` on the calling thread.
    ///
    /// Returns once calibration completed or failed.
    fn calibrate(&self, sink: &mut dyn CalibrationSink) -> OperationResult;

    /// Persists the current calibration.
    fn save_calibration(&self) -> OperationResult;

    /// Restores the persisted calibration.
    fn load_calibration(&self) -> OperationResult;

    /// Longest observed matrix scan in nanoseconds, 0 when unknown.
    fn max_scan_duration_ns(&self) -> u64;

    /// Strobe and input line counts, when the driver knows them.
    fn matrix_size(&self) -> Option<(u8, u8)> {
        None
    }
}

/// One registered matrix device.
pub struct DeviceEntry {
    name: String,
    device: Box<dyn MatrixDevice>,
}

impl DeviceEntry {
    /// Registers `device` under `name`.
    pub fn new(name: impl Into<String>, device: Box<dyn MatrixDevice>) -> Self {
        Self {
            name: name.into(),
            device,
        }
    }

    /// Name the console advertises for this device.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Driver handle used for every operation on this device.
    #[must_use]
    pub fn device(&self) -> &dyn MatrixDevice {
        self.device.as_ref()
    }
}

impl fmt::Debug for DeviceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Errors raised while building the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A device was configured without a name
    #[error("device name must not be empty (entry {index})")]
    EmptyName {
        /// Position of the entry in declaration order
        index: usize,
    },
    /// The name cannot be typed as a single console token
    #[error("device name '{0}' must not contain whitespace")]
    InvalidName(String),
    /// Two devices share a name
    #[error("duplicate device name '{0}'")]
    DuplicateName(String),
}

/// Ordered, immutable list of the devices available to the console.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: Vec<DeviceEntry>,
}

impl DeviceRegistry {
    /// Builds the registry from enumerated devices, keeping their order.
    pub fn new(entries: Vec<DeviceEntry>) -> Result<Self, RegistryError> {
        for (index, entry) in entries.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(RegistryError::EmptyName { index });
            }
            if entry.name.chars().any(char::is_whitespace) {
                return Err(RegistryError::InvalidName(entry.name.clone()));
            }
            if entries[..index].iter().any(|e| e.name == entry.name) {
                return Err(RegistryError::DuplicateName(entry.name.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Number of registered devices.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// True when no device is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, or `None` past the last device.
    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<&DeviceEntry> {
        self.entries.get(index)
    }

    /// Exact, case-sensitive name match.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&DeviceEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Resolves a device name that the command tree advertised.
    ///
    /// # Panics
    ///
    /// Panics when no device has this name. Command handlers only receive names the
    /// console resolved from this registry, so a miss means the wiring is broken.
    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> &DeviceEntry {
        match self.find(name) {
            Some(entry) => entry,
            None => panic!("device '{name}' reached a handler but is not registered"),
        }
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }
}
