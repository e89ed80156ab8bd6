//! Fleet configuration types.
//!
//! This module contains the configuration tree loaded from `fleet.toml`:
//! - `FleetConfig` - cycle time, library selection, device settings, motors
//! - `DeviceConfig` - node discovery and protocol stack settings
//! - `AxisConfig` - one `[[motors]]` entry, mirroring the controller's
//!   parameter groups
//!
//! The `motors` list is kept as raw TOML values so every entry can be
//! deserialized on its own: a malformed entry rejects only that axis.
//!
//! Values are kept in the units used by the configuration (amperes,
//! seconds). Conversion to device units happens when the axis is built.

use crate::config::{ConfigError, LogLevel};
use crate::consts::{CYCLE_TIME_US, MAX_AXES};
use crate::hal::consts::{
    DEFAULT_BAUDRATE, DEFAULT_DEVICE_NAME, DEFAULT_INTERFACE, DEFAULT_LIBRARY,
    DEFAULT_PROTOCOL_STACK, DEFAULT_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_cycle_time_us() -> u32 {
    CYCLE_TIME_US
}

fn default_library() -> String {
    DEFAULT_LIBRARY.to_string()
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

fn default_protocol_stack() -> String {
    DEFAULT_PROTOCOL_STACK.to_string()
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_baudrate() -> u32 {
    DEFAULT_BAUDRATE
}

fn default_timeout_ms() -> u32 {
    DEFAULT_TIMEOUT_MS
}

/// Main configuration loaded from `fleet.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// Cycle time in microseconds.
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,

    /// Vendor library backend name (e.g. "simulation").
    #[serde(default = "default_library")]
    pub library: String,

    /// Skip cyclic I/O for axes that did not reach the enabled state.
    #[serde(default)]
    pub skip_io_unless_enabled: bool,

    /// Logging verbosity.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Node discovery and protocol stack settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Per-backend configuration sections.
    /// Key = library name, Value = backend-specific TOML table.
    #[serde(default)]
    pub driver_config: HashMap<String, toml::Value>,

    /// Motor entries, in fleet order.
    #[serde(default)]
    pub motors: Vec<toml::Value>,
}

impl FleetConfig {
    /// Validate the fleet-level settings.
    ///
    /// Motor entries are checked one by one when the fleet is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_time_us must be greater than 0".to_string(),
            ));
        }

        if self.motors.len() > MAX_AXES {
            return Err(ConfigError::ValidationError(format!(
                "Too many motors: {} (max {})",
                self.motors.len(),
                MAX_AXES
            )));
        }

        self.device.validate()
    }

    /// Deserialize the motor entry at `index`.
    pub fn axis_config(&self, index: usize) -> Result<AxisConfig, ConfigError> {
        let value = self.motors.get(index).ok_or_else(|| {
            ConfigError::ValidationError(format!("No motor entry at index {index}"))
        })?;
        AxisConfig::from_value(value.clone())
    }

    /// Best-effort label for the motor entry at `index`, for error reports
    /// about entries that failed to deserialize.
    pub fn motor_label(&self, index: usize) -> String {
        self.motors
            .get(index)
            .and_then(|v| v.get("name"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("motors[{index}]"))
    }

    /// Backend-specific configuration table, if present.
    pub fn driver_section(&self, library: &str) -> Option<&toml::Value> {
        self.driver_config.get(library)
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
            library: default_library(),
            skip_io_unless_enabled: false,
            log_level: LogLevel::default(),
            device: DeviceConfig::default(),
            driver_config: HashMap::new(),
            motors: Vec::new(),
        }
    }
}

/// Node discovery and protocol stack settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Device name (e.g. "EPOS2").
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Protocol stack name (e.g. "MAXON SERIAL V2").
    #[serde(default = "default_protocol_stack")]
    pub protocol_stack: String,

    /// Interface name (e.g. "USB").
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Protocol stack baudrate.
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,

    /// Protocol stack timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
}

impl DeviceConfig {
    /// Validate the device settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baudrate == 0 {
            return Err(ConfigError::ValidationError(
                "device.baudrate must be greater than 0".to_string(),
            ));
        }
        if self.device_name.is_empty() || self.protocol_stack.is_empty() {
            return Err(ConfigError::ValidationError(
                "device.device_name and device.protocol_stack cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            protocol_stack: default_protocol_stack(),
            interface: default_interface(),
            baudrate: DEFAULT_BAUDRATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// One `[[motors]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Human-readable axis name.
    pub name: String,

    /// Node serial number as hex text.
    pub serial_number: String,

    /// Vendor operation mode code.
    pub operation_mode: i64,

    /// Motor type and electrical model.
    pub motor: MotorConfig,

    /// Sensor type and sensor model.
    pub sensor: SensorConfig,

    /// Safety limits.
    #[serde(default)]
    pub safety: Option<SafetyConfig>,

    /// Position regulator.
    #[serde(default)]
    pub position_regulator: Option<PositionRegulatorConfig>,

    /// Velocity regulator.
    #[serde(default)]
    pub velocity_regulator: Option<VelocityRegulatorConfig>,

    /// Current regulator.
    #[serde(default)]
    pub current_regulator: Option<CurrentRegulatorConfig>,

    /// Position profile.
    #[serde(default)]
    pub position_profile: Option<PositionProfileConfig>,

    /// Velocity profile.
    #[serde(default)]
    pub velocity_profile: Option<VelocityProfileConfig>,

    /// Clear pending device faults before enabling.
    #[serde(default)]
    pub clear_faults: bool,

    /// Initial cyclic set-point (unit depends on the operation mode).
    #[serde(default)]
    pub setpoint: i32,
}

impl AxisConfig {
    /// Deserialize one motor entry from a TOML value.
    pub fn from_value(value: toml::Value) -> Result<Self, ConfigError> {
        value
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))
    }
}

/// Motor section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotorConfig {
    /// Vendor motor type code.
    #[serde(rename = "type")]
    pub motor_type: u16,

    /// DC motor electrical model.
    #[serde(default)]
    pub dc_motor: Option<DcMotorConfig>,

    /// EC motor electrical model.
    #[serde(default)]
    pub ec_motor: Option<EcMotorConfig>,
}

/// DC motor electrical model, SI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DcMotorConfig {
    /// Nominal current [A].
    pub nominal_current: f64,
    /// Maximum output current [A].
    pub max_output_current: f64,
    /// Thermal time constant [s].
    pub thermal_time_constant: f64,
}

/// EC motor electrical model, SI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EcMotorConfig {
    /// Nominal current [A].
    pub nominal_current: f64,
    /// Maximum output current [A].
    pub max_output_current: f64,
    /// Thermal time constant [s].
    pub thermal_time_constant: f64,
    /// Number of pole pairs.
    pub number_of_pole_pairs: u8,
}

/// Sensor section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    /// Vendor sensor type code.
    #[serde(rename = "type")]
    pub sensor_type: u16,

    /// Incremental encoder model.
    #[serde(default)]
    pub incremental_encoder: Option<IncrementalEncoderConfig>,

    /// Hall sensor model.
    #[serde(default)]
    pub hall_sensor: Option<HallSensorConfig>,

    /// SSI absolute encoder model.
    #[serde(default)]
    pub ssi_absolute_encoder: Option<SsiAbsoluteEncoderConfig>,
}

/// Incremental encoder model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncrementalEncoderConfig {
    /// Pulses per turn.
    pub resolution: u32,
    /// Inverted polarity.
    pub inverted_polarity: bool,
}

/// Hall sensor model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HallSensorConfig {
    /// Inverted polarity.
    pub inverted_polarity: bool,
}

/// SSI absolute encoder model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SsiAbsoluteEncoderConfig {
    /// SSI clock rate [kbit/s].
    pub data_rate: u16,
    /// Multi-turn data bits.
    pub number_of_multiturn_bits: u16,
    /// Single-turn data bits.
    pub number_of_singleturn_bits: u16,
    /// Inverted polarity.
    pub inverted_polarity: bool,
}

/// Safety limits, each independently optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    /// Maximum following error [qc].
    #[serde(default)]
    pub max_following_error: Option<u32>,
    /// Maximum profile velocity [rpm].
    #[serde(default)]
    pub max_profile_velocity: Option<u32>,
    /// Maximum acceleration [rpm/s].
    #[serde(default)]
    pub max_acceleration: Option<u32>,
}

/// PID gain triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PidGainConfig {
    /// Proportional gain.
    pub p: u16,
    /// Integral gain.
    pub i: u16,
    /// Derivative gain.
    pub d: u16,
}

/// PI gain pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PiGainConfig {
    /// Proportional gain.
    pub p: u16,
    /// Integral gain.
    pub i: u16,
}

/// Feed-forward pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedForwardConfig {
    /// Velocity feed-forward.
    pub velocity: u16,
    /// Acceleration feed-forward.
    pub acceleration: u16,
}

/// Position regulator section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionRegulatorConfig {
    /// PID gains.
    #[serde(default)]
    pub gain: Option<PidGainConfig>,
    /// Feed-forward factors.
    #[serde(default)]
    pub feed_forward: Option<FeedForwardConfig>,
}

/// Velocity regulator section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VelocityRegulatorConfig {
    /// PI gains.
    #[serde(default)]
    pub gain: Option<PiGainConfig>,
    /// Feed-forward factors.
    #[serde(default)]
    pub feed_forward: Option<FeedForwardConfig>,
}

/// Current regulator section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurrentRegulatorConfig {
    /// PI gains.
    #[serde(default)]
    pub gain: Option<PiGainConfig>,
}

/// Settling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    /// Window size [qc or rpm].
    pub window: u32,
    /// Settle time [s].
    pub time: f64,
}

/// Position profile section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionProfileConfig {
    /// Profile velocity [rpm].
    pub velocity: u32,
    /// Profile acceleration [rpm/s].
    pub acceleration: u32,
    /// Profile deceleration [rpm/s].
    pub deceleration: u32,
    /// Position window.
    #[serde(default)]
    pub window: Option<WindowConfig>,
}

/// Velocity profile section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VelocityProfileConfig {
    /// Profile acceleration [rpm/s].
    pub acceleration: u32,
    /// Profile deceleration [rpm/s].
    pub deceleration: u32,
    /// Velocity window.
    #[serde(default)]
    pub window: Option<WindowConfig>,
}
