//! Vendor library traits and error types.
//!
//! This module defines:
//! - `EposLibrary` trait - pluggable vendor command library (node discovery)
//! - `EposNode` trait - one open node handle, one method per vendor call
//! - `LibraryFactory` type alias - factory function type
//! - `HalError` enum - fleet and runtime errors
//! - `AxisError` enum - per-axis configuration and device errors
//! - `OpenError` enum - node discovery failures

use crate::config::ConfigError;
use crate::hal::config::{DeviceConfig, FleetConfig};
use crate::hal::types::{
    DcMotorParameter, EcMotorParameter, FeedForward, HallSensorParameter, IncEncoderParameter,
    InitStep, MotorType, OperationMode, PiGain, PidGain, PositionProfile, SensorType,
    SerialNumber, SsiAbsEncoderParameter, VelocityProfile, VendorError, VendorResult, Window,
};
use thiserror::Error;

/// Fleet and runtime errors.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Fleet-level configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// The configuration defines no motors.
    #[error("No motors defined")]
    NoAxesConfigured,

    /// Two motor entries share a serial number.
    #[error("Duplicate serial number {serial} (axes '{first}' and '{second}')")]
    DuplicateSerialNumber {
        /// Shared serial number.
        serial: SerialNumber,
        /// Axis declared first.
        first: String,
        /// Axis declared second.
        second: String,
    },

    /// Vendor library backend not registered.
    #[error("Vendor library not found: {0}")]
    DriverNotFound(String),

    /// Vendor library initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),
}

/// Why an axis could not be configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxisError {
    /// Configuration entry malformed; no hardware call was made.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No node answered to the configured serial number.
    #[error("no device found with serial number {serial}")]
    DeviceNotFound {
        /// Serial number searched for.
        serial: SerialNumber,
    },

    /// A vendor call failed during initialization.
    #[error("device error during {step}: {error}")]
    Device {
        /// Step that issued the failing call.
        step: InitStep,
        /// Vendor error code.
        error: VendorError,
    },
}

impl AxisError {
    /// Attribute a vendor error to an initialization step.
    #[inline]
    pub const fn device(step: InitStep, error: VendorError) -> Self {
        Self::Device { step, error }
    }
}

/// Node discovery failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OpenError {
    /// No node with the requested serial number responded.
    #[error("node not found")]
    NotFound,

    /// Discovery itself failed.
    #[error(transparent)]
    Vendor(#[from] VendorError),
}

/// Factory function type for creating library instances.
pub type LibraryFactory = fn() -> Box<dyn EposLibrary>;

/// Pluggable vendor command library.
///
/// # Lifecycle
///
/// 1. `init()` - Called once with the fleet configuration
/// 2. `open_node()` - Called once per axis during fleet initialization
/// 3. `shutdown()` - Called after every node has been released
///
/// Calls are synchronous and blocking.
pub trait EposLibrary: Send {
    /// Returns the library's unique identifier (e.g. "simulation").
    fn name(&self) -> &'static str;

    /// Returns the library's version.
    fn version(&self) -> &'static str;

    /// Initialize the library.
    ///
    /// Backend-specific settings are read from
    /// `config.driver_config[self.name()]`.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if initialization cannot complete.
    fn init(&mut self, config: &FleetConfig) -> Result<(), HalError>;

    /// Find the node with `serial` on the configured interface and open it.
    fn open_node(
        &mut self,
        device: &DeviceConfig,
        serial: SerialNumber,
    ) -> Result<Box<dyn EposNode>, OpenError>;

    /// Release library resources.
    fn shutdown(&mut self) -> Result<(), HalError> {
        Ok(())
    }
}

/// One open node handle.
///
/// Every method maps to one vendor library call. At most one call is in
/// flight per handle; the returned error code is for diagnostics only.
pub trait EposNode: Send {
    /// Serial number this handle was opened for.
    fn serial_number(&self) -> SerialNumber;

    /// Set protocol stack baudrate and timeout.
    fn set_protocol_stack_settings(&mut self, baudrate: u32, timeout_ms: u32) -> VendorResult<()>;

    /// Select the operation mode.
    fn set_operation_mode(&mut self, mode: OperationMode) -> VendorResult<()>;

    /// Select the motor type.
    fn set_motor_type(&mut self, motor_type: MotorType) -> VendorResult<()>;

    /// Write DC motor parameters.
    fn set_dc_motor_parameter(&mut self, parameter: &DcMotorParameter) -> VendorResult<()>;

    /// Write EC motor parameters.
    fn set_ec_motor_parameter(&mut self, parameter: &EcMotorParameter) -> VendorResult<()>;

    /// Select the position sensor type.
    fn set_sensor_type(&mut self, sensor_type: SensorType) -> VendorResult<()>;

    /// Write incremental encoder parameters.
    fn set_inc_encoder_parameter(&mut self, parameter: &IncEncoderParameter) -> VendorResult<()>;

    /// Write hall sensor parameters.
    fn set_hall_sensor_parameter(&mut self, parameter: &HallSensorParameter) -> VendorResult<()>;

    /// Write SSI absolute encoder parameters.
    fn set_ssi_abs_encoder_parameter(
        &mut self,
        parameter: &SsiAbsEncoderParameter,
    ) -> VendorResult<()>;

    /// Set the maximum following error.
    fn set_max_following_error(&mut self, value: u32) -> VendorResult<()>;

    /// Set the maximum profile velocity.
    fn set_max_profile_velocity(&mut self, value: u32) -> VendorResult<()>;

    /// Set the maximum acceleration.
    fn set_max_acceleration(&mut self, value: u32) -> VendorResult<()>;

    /// Write position regulator gains.
    fn set_position_regulator_gain(&mut self, gain: &PidGain) -> VendorResult<()>;

    /// Write position regulator feed-forward.
    fn set_position_regulator_feed_forward(&mut self, feed_forward: &FeedForward)
    -> VendorResult<()>;

    /// Write velocity regulator gains.
    fn set_velocity_regulator_gain(&mut self, gain: &PiGain) -> VendorResult<()>;

    /// Write velocity regulator feed-forward.
    fn set_velocity_regulator_feed_forward(&mut self, feed_forward: &FeedForward)
    -> VendorResult<()>;

    /// Write current regulator gains.
    fn set_current_regulator_gain(&mut self, gain: &PiGain) -> VendorResult<()>;

    /// Write the position profile.
    fn set_position_profile(&mut self, profile: &PositionProfile) -> VendorResult<()>;

    /// Enable the position window.
    fn enable_position_window(&mut self, window: &Window) -> VendorResult<()>;

    /// Write the velocity profile.
    fn set_velocity_profile(&mut self, profile: &VelocityProfile) -> VendorResult<()>;

    /// Enable the velocity window.
    fn enable_velocity_window(&mut self, window: &Window) -> VendorResult<()>;

    /// Number of pending device errors.
    fn device_error_count(&mut self) -> VendorResult<u8>;

    /// Code of the pending device error at `index` (1-based).
    fn device_error_code(&mut self, index: u8) -> VendorResult<u32>;

    /// Clear all device faults.
    fn clear_fault(&mut self) -> VendorResult<()>;

    /// Transition to the enabled state.
    fn set_enable_state(&mut self) -> VendorResult<()>;

    /// Transition to the disabled state.
    fn set_disable_state(&mut self) -> VendorResult<()>;

    /// Actual position.
    fn position_is(&mut self) -> VendorResult<i32>;

    /// Actual velocity.
    fn velocity_is(&mut self) -> VendorResult<i32>;

    /// Actual current.
    fn current_is(&mut self) -> VendorResult<i16>;

    /// Profile velocity mode command.
    fn move_with_velocity(&mut self, velocity: i32) -> VendorResult<()>;

    /// Profile position mode command.
    fn move_to_position(&mut self, position: i32, absolute: bool, immediately: bool)
    -> VendorResult<()>;

    /// Position mode set-point.
    fn set_position_must(&mut self, position: i32) -> VendorResult<()>;

    /// Velocity mode set-point.
    fn set_velocity_must(&mut self, velocity: i32) -> VendorResult<()>;

    /// Current mode set-point.
    fn set_current_must(&mut self, current: i16) -> VendorResult<()>;

    /// Close the handle.
    fn close(&mut self) -> VendorResult<()>;
}
