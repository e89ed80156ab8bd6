//! Prelude module for common re-exports.
//!
//! ```rust
//! use epos_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel};
pub use crate::hal::config::{AxisConfig, DeviceConfig, FleetConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CYCLE_TIME_US, MAX_AXES};

// ─── Vendor Library ─────────────────────────────────────────────────
pub use crate::hal::driver::{AxisError, EposLibrary, EposNode, HalError, LibraryFactory, OpenError};
pub use crate::hal::types::{
    InitStep, MotorType, OperationMode, SensorType, SerialNumber, Telemetry, VendorError,
    VendorResult,
};

/// Default cycle time as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US as u64);
