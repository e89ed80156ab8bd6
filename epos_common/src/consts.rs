//! System-wide constants for the EPOS fleet workspace.
//!
//! Single source of truth for numeric limits and default paths.

/// Maximum number of axes in one fleet.
pub const MAX_AXES: usize = 64;

/// Default cycle time in microseconds (100 Hz = 10 000 µs).
pub const CYCLE_TIME_US: u32 = 10_000;

/// Default fleet configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/epos/fleet.toml";
