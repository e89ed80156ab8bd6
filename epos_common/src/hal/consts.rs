//! Vendor library constants.
//!
//! Defaults for opening an EPOS node and the unit factors between the
//! SI values found in configuration and the device's native units.

/// Canonical HAL service name (used for logging).
pub const HAL_SERVICE_NAME: &str = "epos_hal";

/// Default vendor library backend.
pub const DEFAULT_LIBRARY: &str = "simulation";

/// Default device name passed to node discovery.
pub const DEFAULT_DEVICE_NAME: &str = "EPOS2";

/// Default protocol stack name passed to node discovery.
pub const DEFAULT_PROTOCOL_STACK: &str = "MAXON SERIAL V2";

/// Default interface name passed to node discovery.
pub const DEFAULT_INTERFACE: &str = "USB";

/// Default protocol stack baudrate.
pub const DEFAULT_BAUDRATE: u32 = 1_000_000;

/// Default protocol stack timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 500;

/// Amperes to milliamperes.
pub const MILLIAMPS_PER_AMP: f64 = 1000.0;

/// Seconds to the 100 ms units used for thermal time constants.
pub const DECISECONDS_PER_SECOND: f64 = 10.0;

/// Seconds to milliseconds (window settle time).
pub const MILLISECONDS_PER_SECOND: f64 = 1000.0;
