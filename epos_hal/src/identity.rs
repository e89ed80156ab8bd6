//! Axis identity resolution.
//!
//! Turns the `name`, `serial_number` and `operation_mode` fields of a motor
//! entry into a validated [`AxisIdentity`]. No I/O is performed.

use epos_common::config::ConfigError;
use epos_common::hal::config::AxisConfig;
use epos_common::hal::types::{OperationMode, SerialNumber};

/// Validated identity of one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisIdentity {
    /// Human-readable axis name.
    pub name: String,
    /// Node serial number.
    pub serial_number: SerialNumber,
    /// Control law the node runs.
    pub operation_mode: OperationMode,
}

/// Resolve the identity fields of a motor entry.
///
/// # Errors
/// - `ConfigError::ValidationError` if `name` is empty
/// - `ConfigError::InvalidSerialNumber` if `serial_number` is not hex
/// - `ConfigError::InvalidField` if `operation_mode` is not a known mode
pub fn resolve_identity(config: &AxisConfig) -> Result<AxisIdentity, ConfigError> {
    if config.name.is_empty() {
        return Err(ConfigError::ValidationError(
            "motor name cannot be empty".to_string(),
        ));
    }

    let serial_number: SerialNumber = config.serial_number.parse()?;

    let operation_mode = OperationMode::from_code(config.operation_mode).ok_or_else(|| {
        ConfigError::invalid_field(
            "operation_mode",
            format!("unsupported operation mode {}", config.operation_mode),
        )
    })?;

    Ok(AxisIdentity {
        name: config.name.clone(),
        serial_number,
        operation_mode,
    })
}
