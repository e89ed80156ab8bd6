//! Vendor call records.

use epos_common::hal::types::{
    DcMotorParameter, EcMotorParameter, FeedForward, HallSensorParameter, IncEncoderParameter,
    MotorType, OperationMode, PiGain, PidGain, PositionProfile, SensorType,
    SsiAbsEncoderParameter, VelocityProfile, Window,
};
use serde::Deserialize;

/// One vendor call as issued to a simulated node, with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum VendorCall {
    OpenNode,
    SetProtocolStackSettings { baudrate: u32, timeout_ms: u32 },
    SetOperationMode(OperationMode),
    SetMotorType(MotorType),
    SetDcMotorParameter(DcMotorParameter),
    SetEcMotorParameter(EcMotorParameter),
    SetSensorType(SensorType),
    SetIncEncoderParameter(IncEncoderParameter),
    SetHallSensorParameter(HallSensorParameter),
    SetSsiAbsEncoderParameter(SsiAbsEncoderParameter),
    SetMaxFollowingError(u32),
    SetMaxProfileVelocity(u32),
    SetMaxAcceleration(u32),
    SetPositionRegulatorGain(PidGain),
    SetPositionRegulatorFeedForward(FeedForward),
    SetVelocityRegulatorGain(PiGain),
    SetVelocityRegulatorFeedForward(FeedForward),
    SetCurrentRegulatorGain(PiGain),
    SetPositionProfile(PositionProfile),
    EnablePositionWindow(Window),
    SetVelocityProfile(VelocityProfile),
    EnableVelocityWindow(Window),
    GetNbOfDeviceError,
    GetDeviceErrorCode(u8),
    ClearFault,
    SetEnableState,
    SetDisableState,
    GetPositionIs,
    GetVelocityIs,
    GetCurrentIs,
    MoveWithVelocity(i32),
    MoveToPosition {
        position: i32,
        absolute: bool,
        immediately: bool,
    },
    SetPositionMust(i32),
    SetVelocityMust(i32),
    SetCurrentMust(i16),
    CloseNode,
}

/// Vendor call kind without arguments.
///
/// Used to select calls for failure injection, also from
/// `[driver_config.simulation]` as snake_case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Operation {
    OpenNode,
    SetProtocolStackSettings,
    SetOperationMode,
    SetMotorType,
    SetDcMotorParameter,
    SetEcMotorParameter,
    SetSensorType,
    SetIncEncoderParameter,
    SetHallSensorParameter,
    SetSsiAbsEncoderParameter,
    SetMaxFollowingError,
    SetMaxProfileVelocity,
    SetMaxAcceleration,
    SetPositionRegulatorGain,
    SetPositionRegulatorFeedForward,
    SetVelocityRegulatorGain,
    SetVelocityRegulatorFeedForward,
    SetCurrentRegulatorGain,
    SetPositionProfile,
    EnablePositionWindow,
    SetVelocityProfile,
    EnableVelocityWindow,
    GetNbOfDeviceError,
    GetDeviceErrorCode,
    ClearFault,
    SetEnableState,
    SetDisableState,
    GetPositionIs,
    GetVelocityIs,
    GetCurrentIs,
    MoveWithVelocity,
    MoveToPosition,
    SetPositionMust,
    SetVelocityMust,
    SetCurrentMust,
    CloseNode,
}

impl VendorCall {
    /// Kind of this call.
    pub const fn operation(&self) -> Operation {
        match self {
            VendorCall::OpenNode => Operation::OpenNode,
            VendorCall::SetProtocolStackSettings { .. } => Operation::SetProtocolStackSettings,
            VendorCall::SetOperationMode(_) => Operation::SetOperationMode,
            VendorCall::SetMotorType(_) => Operation::SetMotorType,
            VendorCall::SetDcMotorParameter(_) => Operation::SetDcMotorParameter,
            VendorCall::SetEcMotorParameter(_) => Operation::SetEcMotorParameter,
            VendorCall::SetSensorType(_) => Operation::SetSensorType,
            VendorCall::SetIncEncoderParameter(_) => Operation::SetIncEncoderParameter,
            VendorCall::SetHallSensorParameter(_) => Operation::SetHallSensorParameter,
            VendorCall::SetSsiAbsEncoderParameter(_) => Operation::SetSsiAbsEncoderParameter,
            VendorCall::SetMaxFollowingError(_) => Operation::SetMaxFollowingError,
            VendorCall::SetMaxProfileVelocity(_) => Operation::SetMaxProfileVelocity,
            VendorCall::SetMaxAcceleration(_) => Operation::SetMaxAcceleration,
            VendorCall::SetPositionRegulatorGain(_) => Operation::SetPositionRegulatorGain,
            VendorCall::SetPositionRegulatorFeedForward(_) => {
                Operation::SetPositionRegulatorFeedForward
            }
            VendorCall::SetVelocityRegulatorGain(_) => Operation::SetVelocityRegulatorGain,
            VendorCall::SetVelocityRegulatorFeedForward(_) => {
                Operation::SetVelocityRegulatorFeedForward
            }
            VendorCall::SetCurrentRegulatorGain(_) => Operation::SetCurrentRegulatorGain,
            VendorCall::SetPositionProfile(_) => Operation::SetPositionProfile,
            VendorCall::EnablePositionWindow(_) => Operation::EnablePositionWindow,
            VendorCall::SetVelocityProfile(_) => Operation::SetVelocityProfile,
            VendorCall::EnableVelocityWindow(_) => Operation::EnableVelocityWindow,
            VendorCall::GetNbOfDeviceError => Operation::GetNbOfDeviceError,
            VendorCall::GetDeviceErrorCode(_) => Operation::GetDeviceErrorCode,
            VendorCall::ClearFault => Operation::ClearFault,
            VendorCall::SetEnableState => Operation::SetEnableState,
            VendorCall::SetDisableState => Operation::SetDisableState,
            VendorCall::GetPositionIs => Operation::GetPositionIs,
            VendorCall::GetVelocityIs => Operation::GetVelocityIs,
            VendorCall::GetCurrentIs => Operation::GetCurrentIs,
            VendorCall::MoveWithVelocity(_) => Operation::MoveWithVelocity,
            VendorCall::MoveToPosition { .. } => Operation::MoveToPosition,
            VendorCall::SetPositionMust(_) => Operation::SetPositionMust,
            VendorCall::SetVelocityMust(_) => Operation::SetVelocityMust,
            VendorCall::SetCurrentMust(_) => Operation::SetCurrentMust,
            VendorCall::CloseNode => Operation::CloseNode,
        }
    }
}
