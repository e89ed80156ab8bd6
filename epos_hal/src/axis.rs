//! One axis: resolved configuration, session, state and cyclic I/O.

use crate::params::AxisSpec;
use crate::sequencer::{self, AxisState};
use crate::session::DeviceSession;
use epos_common::config::ConfigError;
use epos_common::hal::config::{AxisConfig, DeviceConfig};
use epos_common::hal::driver::{AxisError, EposLibrary, EposNode};
use epos_common::hal::types::{
    OperationMode, SerialNumber, Telemetry, VendorError, VendorResult,
};
use tracing::{debug, trace};

/// Cyclic command for one operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Profile velocity: move with velocity.
    MoveWithVelocity(i32),
    /// Velocity mode: velocity set-point.
    VelocityMust(i32),
    /// Profile position: absolute move, started immediately.
    MoveToPosition(i32),
    /// Position mode: position set-point.
    PositionMust(i32),
    /// Current mode: current set-point.
    CurrentMust(i16),
}

impl Command {
    /// Route `setpoint` to the command matching `mode`.
    ///
    /// Current set-points are clamped to the 16-bit device range.
    pub fn for_mode(mode: OperationMode, setpoint: i32) -> Self {
        match mode {
            OperationMode::ProfileVelocity => Command::MoveWithVelocity(setpoint),
            OperationMode::Velocity => Command::VelocityMust(setpoint),
            OperationMode::ProfilePosition => Command::MoveToPosition(setpoint),
            OperationMode::Position => Command::PositionMust(setpoint),
            OperationMode::Current => Command::CurrentMust(
                setpoint.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
            ),
        }
    }

    /// Issue the command.
    pub fn send(self, node: &mut dyn EposNode) -> VendorResult<()> {
        match self {
            Command::MoveWithVelocity(v) => node.move_with_velocity(v),
            Command::VelocityMust(v) => node.set_velocity_must(v),
            Command::MoveToPosition(p) => node.move_to_position(p, true, true),
            Command::PositionMust(p) => node.set_position_must(p),
            Command::CurrentMust(c) => node.set_current_must(c),
        }
    }
}

/// Cyclic I/O failure counters for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisDiagnostics {
    /// Failed telemetry queries.
    pub read_errors: u64,
    /// Failed commands.
    pub write_errors: u64,
    /// Most recent telemetry query error.
    pub last_read_error: Option<VendorError>,
    /// Most recent command error.
    pub last_write_error: Option<VendorError>,
}

/// One configured axis.
#[derive(Debug)]
pub struct Axis {
    spec: AxisSpec,
    state: AxisState,
    session: Option<DeviceSession>,
    setpoint: i32,
    telemetry: Telemetry,
    diagnostics: AxisDiagnostics,
}

impl Axis {
    /// Build an axis from a motor entry. No hardware call is made.
    pub fn new(config: &AxisConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_spec(AxisSpec::from_config(config)?))
    }

    /// Build an axis from an already resolved spec.
    pub fn from_spec(spec: AxisSpec) -> Self {
        let setpoint = spec.setpoint;
        Self {
            spec,
            state: AxisState::Uninitialized,
            session: None,
            setpoint,
            telemetry: Telemetry::default(),
            diagnostics: AxisDiagnostics::default(),
        }
    }

    /// Open the node and run the initialization sequence.
    ///
    /// A session held from an earlier call is released first, so the node
    /// is reprogrammed from a closed handle. On error the axis is left
    /// `Failed`. The session is kept if the node was opened, so cyclic I/O
    /// can still reach it.
    pub fn init(
        &mut self,
        library: &mut dyn EposLibrary,
        device: &DeviceConfig,
    ) -> Result<(), AxisError> {
        let result = self.run_sequence(library, device);
        if result.is_err() {
            self.state = AxisState::Failed;
        }
        result
    }

    fn run_sequence(
        &mut self,
        library: &mut dyn EposLibrary,
        device: &DeviceConfig,
    ) -> Result<(), AxisError> {
        self.release();
        let session = DeviceSession::open(library, device, self.serial_number())?;
        self.state = AxisState::Connected;
        let session = self.session.insert(session);
        sequencer::program(&self.spec, session, device, &mut self.state)
    }

    /// Query position, velocity and current.
    ///
    /// A failed query keeps the previous value and is counted.
    pub fn read(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let name = self.spec.identity.name.as_str();
        let diagnostics = &mut self.diagnostics;
        let mut record = |quantity: &str, error: VendorError| {
            diagnostics.read_errors += 1;
            diagnostics.last_read_error = Some(error);
            trace!("Axis '{}': {} query failed: {}", name, quantity, error);
        };

        match session.position() {
            Ok(v) => self.telemetry.position = v,
            Err(e) => record("position", e),
        }
        match session.velocity() {
            Ok(v) => self.telemetry.velocity = v,
            Err(e) => record("velocity", e),
        }
        match session.current() {
            Ok(v) => self.telemetry.current = v,
            Err(e) => record("current", e),
        }
    }

    /// Issue the set-point command for the configured operation mode.
    pub fn write(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let command = Command::for_mode(self.spec.identity.operation_mode, self.setpoint);
        if let Err(e) = command.send(session.node()) {
            self.diagnostics.write_errors += 1;
            self.diagnostics.last_write_error = Some(e);
            trace!(
                "Axis '{}': {:?} failed: {}",
                self.spec.identity.name, command, e
            );
        }
    }

    /// Disable and close the node.
    pub fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
            self.state = AxisState::Disabled;
            debug!("Axis '{}' released", self.spec.identity.name);
        }
    }

    /// Axis name.
    pub fn name(&self) -> &str {
        &self.spec.identity.name
    }

    /// Node serial number.
    pub fn serial_number(&self) -> SerialNumber {
        self.spec.identity.serial_number
    }

    /// Operation mode.
    pub fn operation_mode(&self) -> OperationMode {
        self.spec.identity.operation_mode
    }

    /// Resolved configuration.
    pub fn spec(&self) -> &AxisSpec {
        &self.spec
    }

    /// Lifecycle state.
    pub fn state(&self) -> AxisState {
        self.state
    }

    /// Whether a node handle is held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Current cyclic set-point.
    pub fn setpoint(&self) -> i32 {
        self.setpoint
    }

    /// Change the cyclic set-point.
    pub fn set_setpoint(&mut self, setpoint: i32) {
        self.setpoint = setpoint;
    }

    /// Last-known telemetry.
    pub fn telemetry(&self) -> Telemetry {
        self.telemetry
    }

    /// Cyclic I/O failure counters.
    pub fn diagnostics(&self) -> AxisDiagnostics {
        self.diagnostics
    }
}

impl Drop for Axis {
    fn drop(&mut self) {
        self.release();
    }
}
