//! Simulation library implementation.
//!
//! The `SimulationLibrary` implements the `EposLibrary` trait on top of a
//! [`SimulationBus`]. Every serial number answers discovery unless marked
//! missing.
//!
//! # Configuration
//!
//! ```toml
//! [driver_config.simulation]
//! missing = ["602F3AC3"]
//!
//! [driver_config.simulation.faults]
//! "602F3AC1" = [0x8611]
//!
//! [[driver_config.simulation.fail]]
//! serial = "602F3AC2"
//! operation = "set_sensor_type"
//! code = 0x10000003
//! ```

use super::bus::SimulationBus;
use super::calls::{Operation, VendorCall};
use super::node::SimulatedNode;
use epos_common::hal::config::{DeviceConfig, FleetConfig};
use epos_common::hal::driver::{EposLibrary, EposNode, HalError, OpenError};
use epos_common::hal::types::SerialNumber;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Error code used for injected failures without an explicit code.
pub const DEFAULT_INJECTED_ERROR: u32 = 0x1000_0001;

fn default_injected_error() -> u32 {
    DEFAULT_INJECTED_ERROR
}

/// `[driver_config.simulation]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimulationConfig {
    #[serde(default)]
    missing: Vec<String>,
    #[serde(default)]
    faults: HashMap<String, Vec<u32>>,
    #[serde(default)]
    fail: Vec<FailureConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FailureConfig {
    serial: String,
    operation: Operation,
    #[serde(default = "default_injected_error")]
    code: u32,
}

/// Simulation library implementing the EposLibrary trait.
#[derive(Debug)]
pub struct SimulationLibrary {
    name: &'static str,
    version: &'static str,
    bus: SimulationBus,
}

impl SimulationLibrary {
    /// Create a library on a fresh bus.
    pub fn new() -> Self {
        Self::with_bus(SimulationBus::new())
    }

    /// Create a library on an existing bus.
    pub fn with_bus(bus: SimulationBus) -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            bus,
        }
    }

    /// Handle to the bus, sharing state with this library.
    pub fn bus(&self) -> SimulationBus {
        self.bus.clone()
    }

    fn apply_config(&self, section: &toml::Value) -> Result<(), HalError> {
        let config: SimulationConfig = section
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| HalError::InitFailed(format!("simulation: {e}")))?;

        for raw in &config.missing {
            self.bus.set_missing(raw.parse()?);
        }
        for (raw, codes) in &config.faults {
            let serial: SerialNumber = raw.parse()?;
            for &code in codes {
                self.bus.push_fault(serial, code);
            }
        }
        for failure in &config.fail {
            self.bus
                .fail_on(failure.serial.parse()?, failure.operation, failure.code);
        }

        info!(
            "Simulation: {} missing nodes, {} nodes with faults, {} injected failures",
            config.missing.len(),
            config.faults.len(),
            config.fail.len()
        );
        Ok(())
    }
}

impl Default for SimulationLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl EposLibrary for SimulationLibrary {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &FleetConfig) -> Result<(), HalError> {
        if let Some(section) = config.driver_section(self.name) {
            self.apply_config(section)?;
        }
        info!(
            "Simulation library initialized for {} motor entries",
            config.motors.len()
        );
        Ok(())
    }

    fn open_node(
        &mut self,
        device: &DeviceConfig,
        serial: SerialNumber,
    ) -> Result<Box<dyn EposNode>, OpenError> {
        if !self.bus.is_present(serial) {
            debug!("Simulation: no node {} on {}", serial, device.interface);
            return Err(OpenError::NotFound);
        }
        self.bus.call(serial, VendorCall::OpenNode, |_| Ok(()))?;
        Ok(Box::new(SimulatedNode::new(serial, self.bus.clone())))
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutting down simulation library");
        Ok(())
    }
}
