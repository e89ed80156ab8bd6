//! Axis initialization sequence.
//!
//! Programs a freshly opened node in a fixed order:
//!
//! | # | Step | Entered state |
//! |---|------|---------------|
//! | 1 | open connection | `Connected` |
//! | 2 | protocol settings | |
//! | 3 | operation mode | |
//! | 4 | motor type and parameters | `MotorProgrammed` |
//! | 5 | sensor type and parameters | `SensorProgrammed` |
//! | 6 | safety limits | `SafetyProgrammed` |
//! | 7-9 | position, velocity, current regulators | `RegulatorsProgrammed` |
//! | 10-11 | position, velocity profiles | `ProfilesProgrammed` |
//! | 12 | fault query | |
//! | 13 | fault clearing | `FaultsCleared` |
//! | 14 | enable | `Enabled` |
//!
//! States 6, 7-9, 10-11 and 13 are entered only if the step wrote something.
//! The first failing call stops the sequence and leaves the axis `Failed`.

use crate::params::AxisSpec;
use crate::session::DeviceSession;
use epos_common::hal::config::DeviceConfig;
use epos_common::hal::driver::AxisError;
use epos_common::hal::types::{InitStep, VendorResult};
use std::fmt;
use tracing::{debug, info, warn};

/// Lifecycle state of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AxisState {
    /// Not yet initialized.
    #[default]
    Uninitialized,
    /// Node open.
    Connected,
    /// Motor type and parameters written.
    MotorProgrammed,
    /// Sensor type and parameters written.
    SensorProgrammed,
    /// Safety limits written.
    SafetyProgrammed,
    /// Regulator gains written.
    RegulatorsProgrammed,
    /// Motion profiles written.
    ProfilesProgrammed,
    /// Pending faults cleared.
    FaultsCleared,
    /// Power stage enabled; ready for cyclic I/O.
    Enabled,
    /// Initialization aborted.
    Failed,
    /// Session released.
    Disabled,
}

impl AxisState {
    /// Whether the axis completed initialization.
    #[inline]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, AxisState::Enabled)
    }
}

impl fmt::Display for AxisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Attribute a vendor failure to `step`.
trait AtStep<T> {
    fn at(self, step: InitStep) -> Result<T, AxisError>;
}

impl<T> AtStep<T> for VendorResult<T> {
    #[inline]
    fn at(self, step: InitStep) -> Result<T, AxisError> {
        self.map_err(|e| AxisError::device(step, e))
    }
}

/// Run steps 2-14 on an open session.
///
/// `state` must be `Connected` on entry. It is advanced as steps complete;
/// the caller marks the axis `Failed` when an error is returned.
pub fn program(
    spec: &AxisSpec,
    session: &mut DeviceSession,
    device: &DeviceConfig,
    state: &mut AxisState,
) -> Result<(), AxisError> {
    let name = spec.identity.name.as_str();

    session
        .apply_protocol_settings(device)
        .at(InitStep::ProtocolSettings)?;
    session
        .set_operation_mode(spec.identity.operation_mode)
        .at(InitStep::OperationMode)?;

    spec.motor.apply(session.node()).at(InitStep::Motor)?;
    *state = AxisState::MotorProgrammed;

    spec.sensor.apply(session.node()).at(InitStep::Sensor)?;
    *state = AxisState::SensorProgrammed;

    if let Some(safety) = &spec.safety
        && safety.apply(session.node()).at(InitStep::Safety)?
    {
        *state = AxisState::SafetyProgrammed;
    }

    let mut regulated = false;
    if let Some(regulator) = &spec.position_regulator {
        regulated |= regulator
            .apply(session.node())
            .at(InitStep::PositionRegulator)?;
    }
    if let Some(regulator) = &spec.velocity_regulator {
        regulated |= regulator
            .apply_velocity(session.node())
            .at(InitStep::VelocityRegulator)?;
    }
    if let Some(regulator) = &spec.current_regulator {
        regulated |= regulator
            .apply_current(session.node())
            .at(InitStep::CurrentRegulator)?;
    }
    if regulated {
        *state = AxisState::RegulatorsProgrammed;
    }

    let mut profiled = false;
    if let Some(profile) = &spec.position_profile {
        profile
            .apply(session.node())
            .at(InitStep::PositionProfile)?;
        profiled = true;
    }
    if let Some(profile) = &spec.velocity_profile {
        profile
            .apply(session.node())
            .at(InitStep::VelocityProfile)?;
        profiled = true;
    }
    if profiled {
        *state = AxisState::ProfilesProgrammed;
    }

    let faults = session.pending_faults().at(InitStep::FaultQuery)?;
    for (index, code) in faults.iter().enumerate() {
        warn!(
            "Axis '{}': pending fault {}/{}: 0x{:08X}",
            name,
            index + 1,
            faults.len(),
            code
        );
    }

    if spec.clear_faults {
        session.clear_faults().at(InitStep::ClearFaults)?;
        info!("Axis '{}': cleared faults", name);
        *state = AxisState::FaultsCleared;
    }

    session.enable().at(InitStep::Enable)?;
    *state = AxisState::Enabled;
    debug!("Axis '{}' enabled", name);
    Ok(())
}
