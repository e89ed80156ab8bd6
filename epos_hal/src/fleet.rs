//! Fleet coordination.
//!
//! The `Fleet` owns every axis and the vendor library. It builds one axis
//! per motor entry, initializes them in order and fans out cyclic I/O.
//! A failing axis never stops the others: configuration errors reject
//! only that entry, device errors leave only that axis `Failed`.

use crate::axis::{Axis, AxisDiagnostics};
use crate::sequencer::AxisState;
use epos_common::config::ConfigError;
use epos_common::hal::config::{DeviceConfig, FleetConfig};
use epos_common::hal::driver::{AxisError, EposLibrary, HalError};
use epos_common::hal::types::{SerialNumber, Telemetry};
use std::collections::HashMap;
use tracing::{error, info, warn};

/// A motor entry that could not be turned into an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedAxis {
    /// Position in the `motors` list.
    pub index: usize,
    /// Entry name, or `motors[index]` if the name is unreadable.
    pub name: String,
    /// Why the entry was rejected.
    pub error: ConfigError,
}

/// An axis whose initialization failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisFailure {
    /// Axis name.
    pub name: String,
    /// Serial number, if the entry resolved that far.
    pub serial: Option<SerialNumber>,
    /// What went wrong.
    pub error: AxisError,
}

/// Outcome of [`Fleet::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Names of axes that reached `Enabled`.
    pub enabled: Vec<String>,
    /// Axes that were rejected or failed, in `motors` entry order.
    pub failed: Vec<AxisFailure>,
}

impl InitReport {
    /// Whether every configured axis is enabled.
    pub fn all_enabled(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Per-axis status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisStatus {
    /// Axis name.
    pub name: String,
    /// Serial number.
    pub serial: SerialNumber,
    /// Lifecycle state.
    pub state: AxisState,
    /// Last-known telemetry.
    pub telemetry: Telemetry,
    /// Cyclic I/O failure counters.
    pub diagnostics: AxisDiagnostics,
}

/// Fleet of axes driven through one vendor library.
pub struct Fleet {
    axes: Vec<Axis>,
    /// `motors` index of each axis.
    entries: Vec<usize>,
    rejected: Vec<RejectedAxis>,
    library: Box<dyn EposLibrary>,
    device: DeviceConfig,
    skip_io_unless_enabled: bool,
    shut_down: bool,
}

impl Fleet {
    /// Build the fleet from configuration. No hardware call is made.
    ///
    /// Entries that fail to deserialize or resolve are logged and kept as
    /// [`RejectedAxis`]; they are reported again by [`Fleet::init`].
    ///
    /// # Errors
    /// - `HalError::ConfigError` if fleet-level settings are invalid
    /// - `HalError::NoAxesConfigured` if `motors` is empty
    /// - `HalError::DuplicateSerialNumber` if two entries share a serial
    pub fn from_config(
        config: &FleetConfig,
        library: Box<dyn EposLibrary>,
    ) -> Result<Self, HalError> {
        config.validate()?;

        if config.motors.is_empty() {
            return Err(HalError::NoAxesConfigured);
        }

        let mut axes: Vec<Axis> = Vec::with_capacity(config.motors.len());
        let mut entries = Vec::with_capacity(config.motors.len());
        let mut rejected = Vec::new();
        let mut serials: HashMap<SerialNumber, usize> = HashMap::new();

        for index in 0..config.motors.len() {
            let axis = match config.axis_config(index).and_then(|c| Axis::new(&c)) {
                Ok(axis) => axis,
                Err(e) => {
                    let name = config.motor_label(index);
                    error!("Motor entry '{}' rejected: {}", name, e);
                    rejected.push(RejectedAxis {
                        index,
                        name,
                        error: e,
                    });
                    continue;
                }
            };

            if let Some(&first) = serials.get(&axis.serial_number()) {
                return Err(HalError::DuplicateSerialNumber {
                    serial: axis.serial_number(),
                    first: axes[first].name().to_string(),
                    second: axis.name().to_string(),
                });
            }
            serials.insert(axis.serial_number(), axes.len());
            axes.push(axis);
            entries.push(index);
        }

        info!(
            "Fleet built: {} axes, {} rejected entries, library '{}' v{}",
            axes.len(),
            rejected.len(),
            library.name(),
            library.version()
        );

        Ok(Self {
            axes,
            entries,
            rejected,
            library,
            device: config.device.clone(),
            skip_io_unless_enabled: config.skip_io_unless_enabled,
            shut_down: false,
        })
    }

    /// Initialize every axis in fleet order. Never aborts.
    pub fn init(&mut self) -> InitReport {
        let mut report = InitReport::default();
        let mut failed: Vec<(usize, AxisFailure)> = self
            .rejected
            .iter()
            .map(|rejected| {
                let failure = AxisFailure {
                    name: rejected.name.clone(),
                    serial: None,
                    error: AxisError::Config(rejected.error.clone()),
                };
                (rejected.index, failure)
            })
            .collect();

        for (axis, &index) in self.axes.iter_mut().zip(&self.entries) {
            match axis.init(self.library.as_mut(), &self.device) {
                Ok(()) => {
                    info!("Axis '{}' ({}) enabled", axis.name(), axis.serial_number());
                    report.enabled.push(axis.name().to_string());
                }
                Err(e) => {
                    error!(
                        "Axis '{}' ({}) failed to initialize: {}",
                        axis.name(),
                        axis.serial_number(),
                        e
                    );
                    let failure = AxisFailure {
                        name: axis.name().to_string(),
                        serial: Some(axis.serial_number()),
                        error: e,
                    };
                    failed.push((index, failure));
                }
            }
        }

        failed.sort_by_key(|(index, _)| *index);
        report.failed = failed.into_iter().map(|(_, failure)| failure).collect();

        if report.failed.is_empty() {
            info!("All {} axes enabled", report.enabled.len());
        } else {
            warn!(
                "{} axes enabled, {} failed",
                report.enabled.len(),
                report.failed.len()
            );
        }
        report
    }

    fn io_targets(&mut self) -> impl Iterator<Item = &mut Axis> {
        let gated = self.skip_io_unless_enabled;
        self.axes
            .iter_mut()
            .filter(move |axis| axis.has_session() && (!gated || axis.state().is_enabled()))
    }

    /// Read telemetry from every reachable axis.
    pub fn read(&mut self) {
        for axis in self.io_targets() {
            axis.read();
        }
    }

    /// Send the cyclic command to every reachable axis.
    pub fn write(&mut self) {
        for axis in self.io_targets() {
            axis.write();
        }
    }

    /// Change the set-point of the named axis.
    ///
    /// Returns `false` if no axis has that name.
    pub fn set_setpoint(&mut self, name: &str, setpoint: i32) -> bool {
        match self.axes.iter_mut().find(|a| a.name() == name) {
            Some(axis) => {
                axis.set_setpoint(setpoint);
                true
            }
            None => false,
        }
    }

    /// Look up an axis by name.
    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name() == name)
    }

    /// All axes in fleet order.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Motor entries rejected at build time.
    pub fn rejected(&self) -> &[RejectedAxis] {
        &self.rejected
    }

    /// Status snapshot of every axis.
    pub fn diagnostics(&self) -> Vec<AxisStatus> {
        self.axes
            .iter()
            .map(|axis| AxisStatus {
                name: axis.name().to_string(),
                serial: axis.serial_number(),
                state: axis.state(),
                telemetry: axis.telemetry(),
                diagnostics: axis.diagnostics(),
            })
            .collect()
    }

    /// Name of the vendor library backend.
    pub fn library_name(&self) -> &'static str {
        self.library.name()
    }

    /// Release every axis, then shut the library down. Idempotent.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        for axis in &mut self.axes {
            axis.release();
        }
        info!("Released {} axes", self.axes.len());
        self.library.shutdown()
    }
}

impl Drop for Fleet {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Fleet shutdown on drop failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Fleet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fleet")
            .field("library", &self.library.name())
            .field("axes", &self.axes)
            .field("rejected", &self.rejected)
            .field("skip_io_unless_enabled", &self.skip_io_unless_enabled)
            .finish()
    }
}
