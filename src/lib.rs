//! EC Matrix Console Library
//!
//! This library provides an interactive command console for EC (electro-capacitive)
//! keyboard matrices: a startup device registry, a command tree with one dynamic
//! entry per device, and the rendering of calibration progress events.

// Module declarations
pub mod calibration;
pub mod cli;
pub mod config;
pub mod console;
pub mod constants;
pub mod device;
pub mod shell;
