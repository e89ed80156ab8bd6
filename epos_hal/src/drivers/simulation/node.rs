//! Simulated EPOS node.
//!
//! Parameter writes are recorded and accepted. Motion commands need the
//! enabled state. Kinematics are minimal: velocity
//! commands set the actual velocity, and each position query advances the
//! position by one velocity step.

use super::bus::{ERROR_BAD_FAULT_INDEX, SimulationBus};
use super::calls::VendorCall;
use epos_common::hal::driver::EposNode;
use epos_common::hal::types::{
    DcMotorParameter, EcMotorParameter, FeedForward, HallSensorParameter, IncEncoderParameter,
    MotorType, OperationMode, PiGain, PidGain, PositionProfile, SensorType, SerialNumber,
    SsiAbsEncoderParameter, VelocityProfile, VendorError, VendorResult, Window,
};

/// Handle to one node on a [`SimulationBus`].
#[derive(Debug)]
pub struct SimulatedNode {
    serial: SerialNumber,
    bus: SimulationBus,
}

impl SimulatedNode {
    pub(super) fn new(serial: SerialNumber, bus: SimulationBus) -> Self {
        Self { serial, bus }
    }

    /// Record a parameter write that has no effect on the kinematics.
    fn record(&self, call: VendorCall) -> VendorResult<()> {
        self.bus.call(self.serial, call, |_| Ok(()))
    }
}

impl EposNode for SimulatedNode {
    fn serial_number(&self) -> SerialNumber {
        self.serial
    }

    fn set_protocol_stack_settings(&mut self, baudrate: u32, timeout_ms: u32) -> VendorResult<()> {
        self.record(VendorCall::SetProtocolStackSettings {
            baudrate,
            timeout_ms,
        })
    }

    fn set_operation_mode(&mut self, mode: OperationMode) -> VendorResult<()> {
        self.bus
            .call(self.serial, VendorCall::SetOperationMode(mode), |node| {
                node.operation_mode = Some(mode);
                Ok(())
            })
    }

    fn set_motor_type(&mut self, motor_type: MotorType) -> VendorResult<()> {
        self.record(VendorCall::SetMotorType(motor_type))
    }

    fn set_dc_motor_parameter(&mut self, parameter: &DcMotorParameter) -> VendorResult<()> {
        self.record(VendorCall::SetDcMotorParameter(*parameter))
    }

    fn set_ec_motor_parameter(&mut self, parameter: &EcMotorParameter) -> VendorResult<()> {
        self.record(VendorCall::SetEcMotorParameter(*parameter))
    }

    fn set_sensor_type(&mut self, sensor_type: SensorType) -> VendorResult<()> {
        self.record(VendorCall::SetSensorType(sensor_type))
    }

    fn set_inc_encoder_parameter(&mut self, parameter: &IncEncoderParameter) -> VendorResult<()> {
        self.record(VendorCall::SetIncEncoderParameter(*parameter))
    }

    fn set_hall_sensor_parameter(&mut self, parameter: &HallSensorParameter) -> VendorResult<()> {
        self.record(VendorCall::SetHallSensorParameter(*parameter))
    }

    fn set_ssi_abs_encoder_parameter(
        &mut self,
        parameter: &SsiAbsEncoderParameter,
    ) -> VendorResult<()> {
        self.record(VendorCall::SetSsiAbsEncoderParameter(*parameter))
    }

    fn set_max_following_error(&mut self, value: u32) -> VendorResult<()> {
        self.record(VendorCall::SetMaxFollowingError(value))
    }

    fn set_max_profile_velocity(&mut self, value: u32) -> VendorResult<()> {
        self.record(VendorCall::SetMaxProfileVelocity(value))
    }

    fn set_max_acceleration(&mut self, value: u32) -> VendorResult<()> {
        self.record(VendorCall::SetMaxAcceleration(value))
    }

    fn set_position_regulator_gain(&mut self, gain: &PidGain) -> VendorResult<()> {
        self.record(VendorCall::SetPositionRegulatorGain(*gain))
    }

    fn set_position_regulator_feed_forward(
        &mut self,
        feed_forward: &FeedForward,
    ) -> VendorResult<()> {
        self.record(VendorCall::SetPositionRegulatorFeedForward(*feed_forward))
    }

    fn set_velocity_regulator_gain(&mut self, gain: &PiGain) -> VendorResult<()> {
        self.record(VendorCall::SetVelocityRegulatorGain(*gain))
    }

    fn set_velocity_regulator_feed_forward(
        &mut self,
        feed_forward: &FeedForward,
    ) -> VendorResult<()> {
        self.record(VendorCall::SetVelocityRegulatorFeedForward(*feed_forward))
    }

    fn set_current_regulator_gain(&mut self, gain: &PiGain) -> VendorResult<()> {
        self.record(VendorCall::SetCurrentRegulatorGain(*gain))
    }

    fn set_position_profile(&mut self, profile: &PositionProfile) -> VendorResult<()> {
        self.record(VendorCall::SetPositionProfile(*profile))
    }

    fn enable_position_window(&mut self, window: &Window) -> VendorResult<()> {
        self.record(VendorCall::EnablePositionWindow(*window))
    }

    fn set_velocity_profile(&mut self, profile: &VelocityProfile) -> VendorResult<()> {
        self.record(VendorCall::SetVelocityProfile(*profile))
    }

    fn enable_velocity_window(&mut self, window: &Window) -> VendorResult<()> {
        self.record(VendorCall::EnableVelocityWindow(*window))
    }

    fn device_error_count(&mut self) -> VendorResult<u8> {
        self.bus
            .call(self.serial, VendorCall::GetNbOfDeviceError, |node| {
                Ok(u8::try_from(node.faults.len()).unwrap_or(u8::MAX))
            })
    }

    fn device_error_code(&mut self, index: u8) -> VendorResult<u32> {
        self.bus
            .call(self.serial, VendorCall::GetDeviceErrorCode(index), |node| {
                usize::from(index)
                    .checked_sub(1)
                    .and_then(|i| node.faults.get(i).copied())
                    .ok_or(VendorError::new(ERROR_BAD_FAULT_INDEX))
            })
    }

    fn clear_fault(&mut self) -> VendorResult<()> {
        self.bus.call(self.serial, VendorCall::ClearFault, |node| {
            node.faults.clear();
            Ok(())
        })
    }

    fn set_enable_state(&mut self) -> VendorResult<()> {
        self.bus.call(self.serial, VendorCall::SetEnableState, |node| {
            node.enabled = true;
            Ok(())
        })
    }

    fn set_disable_state(&mut self) -> VendorResult<()> {
        self.bus
            .call(self.serial, VendorCall::SetDisableState, |node| {
                node.enabled = false;
                node.velocity = 0;
                node.current = 0;
                Ok(())
            })
    }

    fn position_is(&mut self) -> VendorResult<i32> {
        self.bus.call(self.serial, VendorCall::GetPositionIs, |node| {
            node.step();
            Ok(node.position)
        })
    }

    fn velocity_is(&mut self) -> VendorResult<i32> {
        self.bus
            .call(self.serial, VendorCall::GetVelocityIs, |node| Ok(node.velocity))
    }

    fn current_is(&mut self) -> VendorResult<i16> {
        self.bus
            .call(self.serial, VendorCall::GetCurrentIs, |node| Ok(node.current))
    }

    fn move_with_velocity(&mut self, velocity: i32) -> VendorResult<()> {
        self.bus
            .call(self.serial, VendorCall::MoveWithVelocity(velocity), |node| {
                node.require_enabled()?;
                node.velocity = velocity;
                Ok(())
            })
    }

    fn move_to_position(
        &mut self,
        position: i32,
        absolute: bool,
        immediately: bool,
    ) -> VendorResult<()> {
        let call = VendorCall::MoveToPosition {
            position,
            absolute,
            immediately,
        };
        self.bus.call(self.serial, call, |node| {
            node.require_enabled()?;
            node.velocity = 0;
            node.position = if absolute {
                position
            } else {
                node.position.wrapping_add(position)
            };
            Ok(())
        })
    }

    fn set_position_must(&mut self, position: i32) -> VendorResult<()> {
        self.bus
            .call(self.serial, VendorCall::SetPositionMust(position), |node| {
                node.require_enabled()?;
                node.velocity = 0;
                node.position = position;
                Ok(())
            })
    }

    fn set_velocity_must(&mut self, velocity: i32) -> VendorResult<()> {
        self.bus
            .call(self.serial, VendorCall::SetVelocityMust(velocity), |node| {
                node.require_enabled()?;
                node.velocity = velocity;
                Ok(())
            })
    }

    fn set_current_must(&mut self, current: i16) -> VendorResult<()> {
        self.bus
            .call(self.serial, VendorCall::SetCurrentMust(current), |node| {
                node.require_enabled()?;
                node.current = current;
                Ok(())
            })
    }

    fn close(&mut self) -> VendorResult<()> {
        self.bus.call(self.serial, VendorCall::CloseNode, |node| {
            node.open = false;
            node.enabled = false;
            Ok(())
        })
    }
}
