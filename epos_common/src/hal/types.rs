//! Device-level types shared between the fleet core and vendor backends.
//!
//! This module defines:
//! - `SerialNumber` - 64-bit node identity, written as hex in configuration
//! - `OperationMode` / `MotorType` / `SensorType` - vendor enumerations
//! - Device-native parameter structs (milliamperes, 100 ms units, ...)
//! - `Telemetry` - last-known position, velocity and current
//! - `VendorError` - numeric error code returned by the vendor library
//! - `InitStep` - the programming step a failure is attributed to

use crate::config::ConfigError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Serial number of an EPOS node.
///
/// Displayed as upper-case hex without prefix; parsing the displayed form
/// yields the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialNumber(pub u64);

impl SerialNumber {
    /// Raw 64-bit value.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl FromStr for SerialNumber {
    type Err = ConfigError;

    /// Parse a hex serial number. An optional `0x`/`0X` prefix is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ConfigError::InvalidSerialNumber {
            value: s.to_string(),
            reason,
        };

        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.is_empty() {
            return Err(invalid("no hex digits"));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("contains non-hex characters"));
        }
        if digits.len() > 16 {
            return Err(invalid("more than 16 hex digits"));
        }

        u64::from_str_radix(digits, 16)
            .map(SerialNumber)
            .map_err(|_| invalid("not a 64-bit value"))
    }
}

/// Control law executed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum OperationMode {
    /// Profile position mode (PPM).
    ProfilePosition = 1,
    /// Profile velocity mode (PVM).
    ProfileVelocity = 3,
    /// Position mode (PM).
    Position = -1,
    /// Velocity mode (VM).
    Velocity = -2,
    /// Current mode (CM).
    Current = -3,
}

impl OperationMode {
    /// Vendor code for this mode.
    #[inline]
    pub const fn code(&self) -> i8 {
        *self as i8
    }

    /// Look up a mode by its vendor code.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::ProfilePosition),
            3 => Some(Self::ProfileVelocity),
            -1 => Some(Self::Position),
            -2 => Some(Self::Velocity),
            -3 => Some(Self::Current),
            _ => None,
        }
    }
}

/// Motor type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MotorType {
    /// Brushed DC motor.
    Dc = 1,
    /// EC motor, sinusoidal commutation.
    EcSinus = 10,
    /// EC motor, block commutation.
    EcBlock = 11,
}

impl MotorType {
    /// Vendor code for this motor type.
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Look up a motor type by its vendor code.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Dc),
            10 => Some(Self::EcSinus),
            11 => Some(Self::EcBlock),
            _ => None,
        }
    }
}

/// Position sensor type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SensorType {
    /// No sensor / unknown.
    Unknown = 0,
    /// Incremental encoder with index (3 channel).
    IncEncoder3Channel = 1,
    /// Incremental encoder without index (2 channel).
    IncEncoder2Channel = 2,
    /// Hall sensors.
    HallSensors = 3,
    /// SSI absolute encoder, binary coded.
    SsiAbsBinary = 4,
    /// SSI absolute encoder, grey coded.
    SsiAbsGrey = 5,
}

impl SensorType {
    /// Vendor code for this sensor type.
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Look up a sensor type by its vendor code.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::IncEncoder3Channel),
            2 => Some(Self::IncEncoder2Channel),
            3 => Some(Self::HallSensors),
            4 => Some(Self::SsiAbsBinary),
            5 => Some(Self::SsiAbsGrey),
            _ => None,
        }
    }
}

/// DC motor parameters in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcMotorParameter {
    /// Nominal current [mA].
    pub nominal_current: u16,
    /// Maximum output current [mA].
    pub max_output_current: u16,
    /// Thermal time constant of the winding [100 ms].
    pub thermal_time_constant: u16,
}

/// EC motor parameters in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcMotorParameter {
    /// Nominal current [mA].
    pub nominal_current: u16,
    /// Maximum output current [mA].
    pub max_output_current: u16,
    /// Thermal time constant of the winding [100 ms].
    pub thermal_time_constant: u16,
    /// Number of pole pairs.
    pub pole_pairs: u8,
}

/// Incremental encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncEncoderParameter {
    /// Pulses per turn.
    pub resolution: u32,
    /// Inverted encoder polarity.
    pub inverted_polarity: bool,
}

/// Hall sensor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HallSensorParameter {
    /// Inverted hall polarity.
    pub inverted_polarity: bool,
}

/// SSI absolute encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsiAbsEncoderParameter {
    /// SSI clock rate [kbit/s].
    pub data_rate: u16,
    /// Number of multi-turn data bits.
    pub multiturn_bits: u16,
    /// Number of single-turn data bits.
    pub singleturn_bits: u16,
    /// Inverted encoder polarity.
    pub inverted_polarity: bool,
}

/// PID gain triple of the position regulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidGain {
    /// Proportional gain.
    pub p: u16,
    /// Integral gain.
    pub i: u16,
    /// Derivative gain.
    pub d: u16,
}

/// PI gain pair of the velocity and current regulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiGain {
    /// Proportional gain.
    pub p: u16,
    /// Integral gain.
    pub i: u16,
}

/// Velocity/acceleration feed-forward pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedForward {
    /// Velocity feed-forward factor.
    pub velocity: u16,
    /// Acceleration feed-forward factor.
    pub acceleration: u16,
}

/// Position profile in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionProfile {
    /// Profile velocity [rpm].
    pub velocity: u32,
    /// Profile acceleration [rpm/s].
    pub acceleration: u32,
    /// Profile deceleration [rpm/s].
    pub deceleration: u32,
}

/// Velocity profile in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VelocityProfile {
    /// Profile acceleration [rpm/s].
    pub acceleration: u32,
    /// Profile deceleration [rpm/s].
    pub deceleration: u32,
}

/// Position or velocity settling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Window size [qc or rpm].
    pub window: u32,
    /// Time the value must stay in the window [ms].
    pub time_ms: u16,
}

/// Last-known telemetry of one axis, in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Telemetry {
    /// Actual position [qc].
    pub position: i32,
    /// Actual velocity [rpm].
    pub velocity: i32,
    /// Actual current [mA].
    pub current: i16,
}

/// Error code returned by a failed vendor library call.
///
/// The code is meaningful for diagnostics only; the core treats any
/// error as pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("vendor error 0x{code:08X}")]
pub struct VendorError {
    /// Vendor-defined error code.
    pub code: u32,
}

impl VendorError {
    /// Wrap a vendor error code.
    #[inline]
    pub const fn new(code: u32) -> Self {
        Self { code }
    }
}

/// Result of a vendor library call.
pub type VendorResult<T> = Result<T, VendorError>;

/// Initialization step a device failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitStep {
    /// Node discovery and open.
    Connect,
    /// Protocol stack settings.
    ProtocolSettings,
    /// Operation mode selection.
    OperationMode,
    /// Motor type and electrical parameters.
    Motor,
    /// Sensor type and sensor parameters.
    Sensor,
    /// Safety limits.
    Safety,
    /// Position regulator gain and feed-forward.
    PositionRegulator,
    /// Velocity regulator gain and feed-forward.
    VelocityRegulator,
    /// Current regulator gain.
    CurrentRegulator,
    /// Position profile and window.
    PositionProfile,
    /// Velocity profile and window.
    VelocityProfile,
    /// Pending device fault query.
    FaultQuery,
    /// Fault clearing.
    ClearFaults,
    /// Transition to the enabled state.
    Enable,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitStep::Connect => "connect",
            InitStep::ProtocolSettings => "protocol settings",
            InitStep::OperationMode => "operation mode",
            InitStep::Motor => "motor",
            InitStep::Sensor => "sensor",
            InitStep::Safety => "safety",
            InitStep::PositionRegulator => "position regulator",
            InitStep::VelocityRegulator => "velocity regulator",
            InitStep::CurrentRegulator => "current regulator",
            InitStep::PositionProfile => "position profile",
            InitStep::VelocityProfile => "velocity profile",
            InitStep::FaultQuery => "fault query",
            InitStep::ClearFaults => "clear faults",
            InitStep::Enable => "enable",
        };
        f.write_str(name)
    }
}
