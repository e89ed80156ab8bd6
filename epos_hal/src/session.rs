//! Device session: the owner of one open node handle.
//!
//! A session is created by [`DeviceSession::open`] and is the only place a
//! node handle is stored. Dropping the session releases the node: a disable
//! transition is attempted, then the handle is closed. Both steps are best
//! effort and only logged on failure.

use epos_common::hal::config::DeviceConfig;
use epos_common::hal::driver::{AxisError, EposLibrary, EposNode, OpenError};
use epos_common::hal::types::{InitStep, OperationMode, SerialNumber, VendorResult};
use tracing::{debug, warn};

/// One open node handle.
pub struct DeviceSession {
    node: Box<dyn EposNode>,
    serial: SerialNumber,
    released: bool,
}

impl DeviceSession {
    /// Discover and open the node with `serial`.
    ///
    /// # Errors
    /// - `AxisError::DeviceNotFound` if no node answers to `serial`
    /// - `AxisError::Device` with step `Connect` for any other open failure
    pub fn open(
        library: &mut dyn EposLibrary,
        device: &DeviceConfig,
        serial: SerialNumber,
    ) -> Result<Self, AxisError> {
        let node = library.open_node(device, serial).map_err(|e| match e {
            OpenError::NotFound => AxisError::DeviceNotFound { serial },
            OpenError::Vendor(error) => AxisError::device(InitStep::Connect, error),
        })?;
        debug!(
            "Opened {} node {} via {} on {}",
            device.device_name, serial, device.protocol_stack, device.interface
        );
        Ok(Self {
            node,
            serial,
            released: false,
        })
    }

    /// Serial number of the node.
    #[inline]
    pub fn serial_number(&self) -> SerialNumber {
        self.serial
    }

    /// Whether the session has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Apply protocol stack baudrate and timeout.
    pub fn apply_protocol_settings(&mut self, device: &DeviceConfig) -> VendorResult<()> {
        self.node
            .set_protocol_stack_settings(device.baudrate, device.timeout_ms)
    }

    /// Select the operation mode.
    pub fn set_operation_mode(&mut self, mode: OperationMode) -> VendorResult<()> {
        self.node.set_operation_mode(mode)
    }

    /// Codes of all pending device faults, oldest first.
    pub fn pending_faults(&mut self) -> VendorResult<Vec<u32>> {
        let count = self.node.device_error_count()?;
        (1..=count)
            .map(|index| self.node.device_error_code(index))
            .collect()
    }

    /// Clear all device faults.
    pub fn clear_faults(&mut self) -> VendorResult<()> {
        self.node.clear_fault()
    }

    /// Transition to the enabled state.
    pub fn enable(&mut self) -> VendorResult<()> {
        self.node.set_enable_state()
    }

    /// Transition to the disabled state.
    pub fn disable(&mut self) -> VendorResult<()> {
        self.node.set_disable_state()
    }

    /// Actual position.
    pub fn position(&mut self) -> VendorResult<i32> {
        self.node.position_is()
    }

    /// Actual velocity.
    pub fn velocity(&mut self) -> VendorResult<i32> {
        self.node.velocity_is()
    }

    /// Actual current.
    pub fn current(&mut self) -> VendorResult<i16> {
        self.node.current_is()
    }

    /// Raw node access for parameter programming and cyclic commands.
    pub(crate) fn node(&mut self) -> &mut dyn EposNode {
        self.node.as_mut()
    }

    /// Disable and close the node. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = self.node.set_disable_state() {
            warn!("Node {}: disable on release failed: {}", self.serial, e);
        }
        if let Err(e) = self.node.close() {
            warn!("Node {}: close failed: {}", self.serial, e);
        }
        debug!("Node {} released", self.serial);
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("serial", &self.serial)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
