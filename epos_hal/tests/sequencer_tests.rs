//! Axis initialization sequence tests.
//!
//! Drives single axes through the simulation backend and checks the exact
//! vendor call order, the unit conversions on the wire and the failure
//! behavior at every step.

use epos_common::config::ConfigLoader;
use epos_common::hal::config::FleetConfig;
use epos_common::hal::driver::AxisError;
use epos_common::hal::types::{
    DcMotorParameter, EcMotorParameter, HallSensorParameter, IncEncoderParameter, InitStep,
    MotorType, OperationMode, PiGain, SensorType, SerialNumber, SsiAbsEncoderParameter,
    VendorError, Window,
};
use epos_hal::drivers::simulation::{Operation, SimulationBus, SimulationLibrary, VendorCall};
use epos_hal::{AxisState, Fleet};

const WHEEL: SerialNumber = SerialNumber(0x1234_5678);
const ARM: SerialNumber = SerialNumber(0xA1);

const SCENARIO: &str = r#"
[[motors]]
name = "wheel"
serial_number = "12345678"
operation_mode = 3

[motors.motor]
type = 1
dc_motor = { nominal_current = 1.0, max_output_current = 2.0, thermal_time_constant = 1.0 }

[motors.sensor]
type = 1
incremental_encoder = { resolution = 500, inverted_polarity = false }
"#;

const FULL_AXIS: &str = r#"
[[motors]]
name = "arm"
serial_number = "A1"
operation_mode = 1
clear_faults = true

[motors.motor]
type = 1
dc_motor = { nominal_current = 1.5, max_output_current = 3.0, thermal_time_constant = 2.0 }

[motors.sensor]
type = 1
incremental_encoder = { resolution = 1024, inverted_polarity = true }

[motors.safety]
max_following_error = 2000
max_profile_velocity = 8000
max_acceleration = 10000

[motors.position_regulator]
gain = { p = 1200, i = 4000, d = 900 }
feed_forward = { velocity = 0, acceleration = 30 }

[motors.velocity_regulator]
gain = { p = 800, i = 120 }
feed_forward = { velocity = 10, acceleration = 20 }

[motors.current_regulator]
gain = { p = 600, i = 150 }

[motors.position_profile]
velocity = 3000
acceleration = 10000
deceleration = 10000
window = { window = 50, time = 0.25 }

[motors.velocity_profile]
acceleration = 5000
deceleration = 6000
window = { window = 20, time = 0.1 }
"#;

fn build_fleet(toml: &str) -> (Fleet, SimulationBus) {
    let config = FleetConfig::from_toml(toml).expect("config should parse");
    let library = SimulationLibrary::new();
    let bus = library.bus();
    let fleet = Fleet::from_config(&config, Box::new(library)).expect("fleet should build");
    (fleet, bus)
}

#[test]
fn scenario_issues_exact_call_sequence() {
    let (mut fleet, bus) = build_fleet(SCENARIO);
    let report = fleet.init();
    assert!(report.all_enabled());
    assert_eq!(report.enabled, vec!["wheel".to_string()]);

    assert_eq!(
        bus.calls(WHEEL),
        vec![
            VendorCall::OpenNode,
            VendorCall::SetProtocolStackSettings {
                baudrate: 1_000_000,
                timeout_ms: 500,
            },
            VendorCall::SetOperationMode(OperationMode::ProfileVelocity),
            VendorCall::SetMotorType(MotorType::Dc),
            VendorCall::SetDcMotorParameter(DcMotorParameter {
                nominal_current: 1000,
                max_output_current: 2000,
                thermal_time_constant: 10,
            }),
            VendorCall::SetSensorType(SensorType::IncEncoder3Channel),
            VendorCall::SetIncEncoderParameter(IncEncoderParameter {
                resolution: 500,
                inverted_polarity: false,
            }),
            VendorCall::GetNbOfDeviceError,
            VendorCall::SetEnableState,
        ]
    );
    assert_eq!(fleet.axis("wheel").unwrap().state(), AxisState::Enabled);
    assert!(bus.node_snapshot(WHEEL).unwrap().enabled);
}

#[test]
fn sensor_type_failure_stops_sequence() {
    let (mut fleet, bus) = build_fleet(SCENARIO);
    bus.fail_on(WHEEL, Operation::SetSensorType, 0x1000_0003);

    let report = fleet.init();
    assert!(report.enabled.is_empty());
    assert_eq!(report.failed.len(), 1);
    let failure = &report.failed[0];
    assert_eq!(failure.name, "wheel");
    assert_eq!(failure.serial, Some(WHEEL));
    assert_eq!(
        failure.error,
        AxisError::device(InitStep::Sensor, VendorError::new(0x1000_0003))
    );

    let axis = fleet.axis("wheel").unwrap();
    assert_eq!(axis.state(), AxisState::Failed);
    assert_eq!(bus.operations(WHEEL).last(), Some(&Operation::SetSensorType));
    assert!(!bus.operations(WHEEL).contains(&Operation::SetIncEncoderParameter));
    assert!(!bus.node_snapshot(WHEEL).unwrap().enabled);
}

#[test]
fn sensor_without_variant_skips_parameter_call() {
    let toml = SCENARIO.replace(
        "incremental_encoder = { resolution = 500, inverted_polarity = false }",
        "",
    );
    let (mut fleet, bus) = build_fleet(&toml);
    assert!(fleet.init().all_enabled());

    let ops = bus.operations(WHEEL);
    assert!(ops.contains(&Operation::SetSensorType));
    assert!(!ops.contains(&Operation::SetIncEncoderParameter));
    assert!(!ops.contains(&Operation::SetHallSensorParameter));
    assert!(!ops.contains(&Operation::SetSsiAbsEncoderParameter));
}

#[test]
fn full_axis_programs_every_section_in_order() {
    let (mut fleet, bus) = build_fleet(FULL_AXIS);
    bus.push_fault(ARM, 0x8611);
    assert!(fleet.init().all_enabled());

    assert_eq!(
        bus.operations(ARM),
        vec![
            Operation::OpenNode,
            Operation::SetProtocolStackSettings,
            Operation::SetOperationMode,
            Operation::SetMotorType,
            Operation::SetDcMotorParameter,
            Operation::SetSensorType,
            Operation::SetIncEncoderParameter,
            Operation::SetMaxFollowingError,
            Operation::SetMaxProfileVelocity,
            Operation::SetMaxAcceleration,
            Operation::SetPositionRegulatorGain,
            Operation::SetPositionRegulatorFeedForward,
            Operation::SetVelocityRegulatorGain,
            Operation::SetVelocityRegulatorFeedForward,
            Operation::SetCurrentRegulatorGain,
            Operation::SetPositionProfile,
            Operation::EnablePositionWindow,
            Operation::SetVelocityProfile,
            Operation::EnableVelocityWindow,
            Operation::GetNbOfDeviceError,
            Operation::GetDeviceErrorCode,
            Operation::ClearFault,
            Operation::SetEnableState,
        ]
    );

    let calls = bus.calls(ARM);
    assert!(calls.contains(&VendorCall::SetDcMotorParameter(DcMotorParameter {
        nominal_current: 1500,
        max_output_current: 3000,
        thermal_time_constant: 20,
    })));
    assert!(calls.contains(&VendorCall::EnablePositionWindow(Window {
        window: 50,
        time_ms: 250,
    })));
    assert!(calls.contains(&VendorCall::EnableVelocityWindow(Window {
        window: 20,
        time_ms: 100,
    })));
    assert!(calls.contains(&VendorCall::GetDeviceErrorCode(1)));
    assert_eq!(bus.node_snapshot(ARM).unwrap().pending_faults, 0);
}

#[test]
fn velocity_regulator_is_applied_once() {
    let (mut fleet, bus) = build_fleet(FULL_AXIS);
    fleet.init();

    let calls = bus.calls(ARM);
    let gains: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, VendorCall::SetVelocityRegulatorGain(_)))
        .collect();
    assert_eq!(
        gains,
        vec![&VendorCall::SetVelocityRegulatorGain(PiGain { p: 800, i: 120 })]
    );
    let feed_forwards = calls
        .iter()
        .filter(|c| c.operation() == Operation::SetVelocityRegulatorFeedForward)
        .count();
    assert_eq!(feed_forwards, 1);
}

#[test]
fn pending_faults_without_clear_flag_are_kept() {
    let toml = FULL_AXIS.replace("clear_faults = true", "clear_faults = false");
    let (mut fleet, bus) = build_fleet(&toml);
    bus.push_fault(ARM, 0x8611);
    bus.push_fault(ARM, 0x3210);
    assert!(fleet.init().all_enabled());

    let calls = bus.calls(ARM);
    assert!(calls.contains(&VendorCall::GetDeviceErrorCode(1)));
    assert!(calls.contains(&VendorCall::GetDeviceErrorCode(2)));
    assert!(!calls.contains(&VendorCall::ClearFault));
    assert_eq!(bus.node_snapshot(ARM).unwrap().pending_faults, 2);
}

#[test]
fn failure_at_any_step_never_enables() {
    let cases = [
        (Operation::OpenNode, InitStep::Connect),
        (Operation::SetProtocolStackSettings, InitStep::ProtocolSettings),
        (Operation::SetOperationMode, InitStep::OperationMode),
        (Operation::SetMotorType, InitStep::Motor),
        (Operation::SetDcMotorParameter, InitStep::Motor),
        (Operation::SetSensorType, InitStep::Sensor),
        (Operation::SetIncEncoderParameter, InitStep::Sensor),
        (Operation::SetMaxFollowingError, InitStep::Safety),
        (Operation::SetMaxProfileVelocity, InitStep::Safety),
        (Operation::SetMaxAcceleration, InitStep::Safety),
        (Operation::SetPositionRegulatorGain, InitStep::PositionRegulator),
        (Operation::SetPositionRegulatorFeedForward, InitStep::PositionRegulator),
        (Operation::SetVelocityRegulatorGain, InitStep::VelocityRegulator),
        (Operation::SetVelocityRegulatorFeedForward, InitStep::VelocityRegulator),
        (Operation::SetCurrentRegulatorGain, InitStep::CurrentRegulator),
        (Operation::SetPositionProfile, InitStep::PositionProfile),
        (Operation::EnablePositionWindow, InitStep::PositionProfile),
        (Operation::SetVelocityProfile, InitStep::VelocityProfile),
        (Operation::EnableVelocityWindow, InitStep::VelocityProfile),
        (Operation::GetNbOfDeviceError, InitStep::FaultQuery),
        (Operation::GetDeviceErrorCode, InitStep::FaultQuery),
        (Operation::ClearFault, InitStep::ClearFaults),
        (Operation::SetEnableState, InitStep::Enable),
    ];

    for (index, (operation, step)) in cases.into_iter().enumerate() {
        let (mut fleet, bus) = build_fleet(FULL_AXIS);
        bus.push_fault(ARM, 0x8611);
        let code = 0x0BAD_0000 + index as u32;
        bus.fail_on(ARM, operation, code);

        let report = fleet.init();
        assert!(report.enabled.is_empty(), "{operation:?}");
        assert_eq!(
            report.failed[0].error,
            AxisError::device(step, VendorError::new(code)),
            "{operation:?}"
        );
        assert_eq!(
            fleet.axis("arm").unwrap().state(),
            AxisState::Failed,
            "{operation:?}"
        );
        assert_eq!(bus.operations(ARM).last(), Some(&operation), "{operation:?}");
        assert!(!bus.node_snapshot(ARM).unwrap().enabled, "{operation:?}");
    }
}

#[test]
fn missing_node_is_device_not_found() {
    let (mut fleet, bus) = build_fleet(SCENARIO);
    bus.set_missing(WHEEL);

    let report = fleet.init();
    assert_eq!(
        report.failed[0].error,
        AxisError::DeviceNotFound { serial: WHEEL }
    );
    let axis = fleet.axis("wheel").unwrap();
    assert_eq!(axis.state(), AxisState::Failed);
    assert!(!axis.has_session());
    assert!(bus.calls(WHEEL).is_empty());
}

#[test]
fn ec_motor_and_ssi_encoder_are_converted() {
    let (mut fleet, bus) = build_fleet(
        r#"
[[motors]]
name = "shoulder"
serial_number = "0x602F3AC1"
operation_mode = -1

[motors.motor]
type = 10
ec_motor = { nominal_current = 3.2, max_output_current = 6.4, thermal_time_constant = 41.6, number_of_pole_pairs = 8 }

[motors.sensor]
type = 4
ssi_absolute_encoder = { data_rate = 1000, number_of_multiturn_bits = 12, number_of_singleturn_bits = 13, inverted_polarity = false }
"#,
    );
    assert!(fleet.init().all_enabled());

    let serial = SerialNumber(0x602F_3AC1);
    let calls = bus.calls(serial);
    assert!(calls.contains(&VendorCall::SetOperationMode(OperationMode::Position)));
    assert!(calls.contains(&VendorCall::SetMotorType(MotorType::EcSinus)));
    assert!(calls.contains(&VendorCall::SetEcMotorParameter(EcMotorParameter {
        nominal_current: 3200,
        max_output_current: 6400,
        thermal_time_constant: 416,
        pole_pairs: 8,
    })));
    assert!(calls.contains(&VendorCall::SetSsiAbsEncoderParameter(
        SsiAbsEncoderParameter {
            data_rate: 1000,
            multiturn_bits: 12,
            singleturn_bits: 13,
            inverted_polarity: false,
        }
    )));
}

#[test]
fn device_settings_are_applied() {
    let toml = format!("[device]\nbaudrate = 250000\ntimeout_ms = 100\n{SCENARIO}");
    let (mut fleet, bus) = build_fleet(&toml);
    fleet.init();
    assert_eq!(
        bus.calls(WHEEL)[1],
        VendorCall::SetProtocolStackSettings {
            baudrate: 250_000,
            timeout_ms: 100,
        }
    );
}

#[test]
fn hall_sensor_parameters_are_written() {
    let toml = SCENARIO.replace(
        "type = 1\nincremental_encoder = { resolution = 500, inverted_polarity = false }",
        "type = 3\nhall_sensor = { inverted_polarity = true }",
    );
    let (mut fleet, bus) = build_fleet(&toml);
    assert!(fleet.init().all_enabled());

    let calls = bus.calls(WHEEL);
    let sensor = calls
        .iter()
        .position(|c| *c == VendorCall::SetSensorType(SensorType::HallSensors))
        .expect("sensor type written");
    assert_eq!(
        calls[sensor + 1],
        VendorCall::SetHallSensorParameter(HallSensorParameter {
            inverted_polarity: true,
        })
    );
    assert!(!bus.operations(WHEEL).contains(&Operation::SetIncEncoderParameter));
}
