//! Fleet coordination and cyclic I/O tests.
//!
//! Multi-axis fleets on the simulation backend: failure isolation,
//! configuration rejection, command routing, read error accounting,
//! teardown, and an end-to-end run through `HalCore`.

use epos_common::prelude::*;
use epos_hal::drivers::simulation::{
    CALL_LOG_CAPACITY, Operation, SimulationBus, SimulationLibrary, VendorCall,
};
use epos_hal::{AxisState, DriverRegistry, Fleet, HalCore};
use std::fs;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

/// One DC motor / incremental encoder entry.
fn motor(name: &str, serial: &str, mode: i64) -> String {
    format!(
        r#"
[[motors]]
name = "{name}"
serial_number = "{serial}"
operation_mode = {mode}

[motors.motor]
type = 1
dc_motor = {{ nominal_current = 1.0, max_output_current = 2.0, thermal_time_constant = 1.0 }}

[motors.sensor]
type = 1
incremental_encoder = {{ resolution = 500, inverted_polarity = false }}
"#
    )
}

fn build_fleet(toml: &str) -> (Fleet, SimulationBus) {
    let config = FleetConfig::from_toml(toml).expect("config should parse");
    let library = SimulationLibrary::new();
    let bus = library.bus();
    let fleet = Fleet::from_config(&config, Box::new(library)).expect("fleet should build");
    (fleet, bus)
}

fn three_axes() -> String {
    [motor("left", "1", 3), motor("right", "2", 3), motor("lift", "3", 1)].concat()
}

#[test]
fn one_failing_axis_does_not_stop_the_others() {
    let (mut fleet, bus) = build_fleet(&three_axes());
    bus.fail_on(SerialNumber(2), Operation::SetMotorType, 0x77);

    let report = fleet.init();
    assert_eq!(report.enabled, vec!["left".to_string(), "lift".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "right");

    let states: Vec<_> = fleet.axes().iter().map(|a| a.state()).collect();
    assert_eq!(
        states,
        vec![AxisState::Enabled, AxisState::Failed, AxisState::Enabled]
    );
}

#[test]
fn failures_are_reported_in_entry_order() {
    let toml = [motor("absent", "1", 3), motor("bad_serial", "XYZ", 3)].concat();
    let (mut fleet, bus) = build_fleet(&toml);
    bus.set_missing(SerialNumber(1));

    let report = fleet.init();
    let names: Vec<_> = report.failed.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["absent", "bad_serial"]);
    assert_eq!(report.failed[0].serial, Some(SerialNumber(1)));
    assert_eq!(report.failed[1].serial, None);
}

#[test]
fn repeated_init_reprograms_enabled_axis() {
    let (mut fleet, bus) = build_fleet(&motor("wheel", "1", 3));
    assert!(fleet.init().all_enabled());

    let report = fleet.init();
    assert_eq!(report.enabled, vec!["wheel".to_string()]);
    assert!(report.failed.is_empty());
    assert_eq!(fleet.axis("wheel").unwrap().state(), AxisState::Enabled);

    let snapshot = bus.node_snapshot(SerialNumber(1)).unwrap();
    assert!(snapshot.open);
    assert!(snapshot.enabled);

    fleet.set_setpoint("wheel", 50);
    fleet.write();
    assert_eq!(fleet.axis("wheel").unwrap().diagnostics().write_errors, 0);
}

#[test]
fn empty_fleet_is_rejected() {
    let config = FleetConfig::from_toml("cycle_time_us = 1000\n").unwrap();
    let result = Fleet::from_config(&config, Box::new(SimulationLibrary::new()));
    assert!(matches!(result, Err(HalError::NoAxesConfigured)));
}

#[test]
fn duplicate_serial_rejects_fleet() {
    let toml = [motor("a", "0x1F", 3), motor("b", "1f", 3)].concat();
    let config = FleetConfig::from_toml(&toml).unwrap();
    let err = Fleet::from_config(&config, Box::new(SimulationLibrary::new())).unwrap_err();
    match err {
        HalError::DuplicateSerialNumber {
            serial,
            first,
            second,
        } => {
            assert_eq!(serial, SerialNumber(0x1F));
            assert_eq!(first, "a");
            assert_eq!(second, "b");
        }
        other => panic!("expected duplicate serial error, got {other:?}"),
    }
}

#[test]
fn bad_entries_reject_only_their_axis() {
    let toml = [
        motor("good", "1", 3),
        motor("bad_serial", "XYZ", 3),
        motor("bad_mode", "3", 6),
        motor("good_too", "4", -2),
    ]
    .concat();
    let (mut fleet, bus) = build_fleet(&toml);

    assert_eq!(fleet.axes().len(), 2);
    let rejected: Vec<_> = fleet.rejected().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(rejected, vec!["bad_serial", "bad_mode"]);

    let report = fleet.init();
    assert_eq!(report.enabled.len(), 2);
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed.iter().all(|f| f.serial.is_none()));
    assert!(matches!(
        report.failed[0].error,
        AxisError::Config(ConfigError::InvalidSerialNumber { .. })
    ));
    assert!(bus.calls(SerialNumber(3)).is_empty());
}

#[test]
fn conflicting_sensor_variants_reject_axis() {
    let toml = motor("double", "1", 3).replace(
        "incremental_encoder =",
        "hall_sensor = { inverted_polarity = true }\nincremental_encoder =",
    );
    let toml = format!("{toml}{}", motor("single", "2", 3));
    let (fleet, _bus) = build_fleet(&toml);
    assert_eq!(fleet.axes().len(), 1);
    assert!(matches!(
        fleet.rejected()[0].error,
        ConfigError::ConflictingSections { section: "sensor", .. }
    ));
}

#[test]
fn write_routes_by_operation_mode() {
    let toml = [
        motor("pvm", "1", 3),
        motor("vm", "2", -2),
        motor("ppm", "3", 1),
        motor("pm", "4", -1),
        motor("cm", "5", -3),
    ]
    .concat();
    let (mut fleet, bus) = build_fleet(&toml);
    assert!(fleet.init().all_enabled());
    for name in ["pvm", "vm", "ppm", "pm"] {
        assert!(fleet.set_setpoint(name, 100));
    }
    assert!(fleet.set_setpoint("cm", 40_000));

    fleet.write();

    let last = |serial| *bus.calls(SerialNumber(serial)).last().unwrap();
    assert_eq!(last(1), VendorCall::MoveWithVelocity(100));
    assert_eq!(last(2), VendorCall::SetVelocityMust(100));
    assert_eq!(
        last(3),
        VendorCall::MoveToPosition {
            position: 100,
            absolute: true,
            immediately: true,
        }
    );
    assert_eq!(last(4), VendorCall::SetPositionMust(100));
    assert_eq!(last(5), VendorCall::SetCurrentMust(i16::MAX));
}

#[test]
fn configured_setpoint_is_used() {
    let toml = motor("wheel", "1", 3).replace("operation_mode = 3", "operation_mode = 3\nsetpoint = 250");
    let (mut fleet, bus) = build_fleet(&toml);
    fleet.init();
    assert_eq!(fleet.axis("wheel").unwrap().setpoint(), 250);
    fleet.write();
    assert_eq!(
        bus.calls(SerialNumber(1)).last(),
        Some(&VendorCall::MoveWithVelocity(250))
    );
    assert!(!fleet.set_setpoint("nope", 1));
}

#[test]
fn read_updates_telemetry() {
    let (mut fleet, _bus) = build_fleet(&motor("wheel", "1", 3));
    fleet.init();
    fleet.set_setpoint("wheel", 100);

    fleet.write();
    fleet.read();
    fleet.read();

    let telemetry = fleet.axis("wheel").unwrap().telemetry();
    assert_eq!(telemetry.velocity, 100);
    assert_eq!(telemetry.position, 200);
    assert_eq!(fleet.axis("wheel").unwrap().diagnostics().read_errors, 0);
}

#[test]
fn read_error_keeps_previous_value() {
    let (mut fleet, bus) = build_fleet(&motor("wheel", "1", 3));
    fleet.init();
    fleet.set_setpoint("wheel", 100);
    fleet.write();
    fleet.read();

    bus.fail_on(SerialNumber(1), Operation::GetVelocityIs, 0x99);
    fleet.set_setpoint("wheel", 300);
    fleet.write();
    fleet.read();

    let axis = fleet.axis("wheel").unwrap();
    assert_eq!(axis.telemetry().velocity, 100);
    assert_eq!(axis.telemetry().position, 400);
    let diagnostics = axis.diagnostics();
    assert_eq!(diagnostics.read_errors, 1);
    assert_eq!(diagnostics.last_read_error, Some(VendorError::new(0x99)));
}

#[test]
fn failed_axis_with_session_still_gets_io() {
    let (mut fleet, bus) = build_fleet(&motor("wheel", "1", 3));
    bus.fail_on(SerialNumber(1), Operation::SetEnableState, 0x5);
    fleet.init();
    bus.clear_calls(SerialNumber(1));

    fleet.read();
    fleet.write();

    let ops = bus.operations(SerialNumber(1));
    assert_eq!(
        ops,
        vec![
            Operation::GetPositionIs,
            Operation::GetVelocityIs,
            Operation::GetCurrentIs,
            Operation::MoveWithVelocity,
        ]
    );
    let diagnostics = fleet.axis("wheel").unwrap().diagnostics();
    assert_eq!(diagnostics.write_errors, 1);
    assert!(diagnostics.last_write_error.is_some());
}

#[test]
fn io_gating_skips_axes_that_are_not_enabled() {
    let toml = format!(
        "skip_io_unless_enabled = true\n{}",
        [motor("ok", "1", 3), motor("broken", "2", 3)].concat()
    );
    let (mut fleet, bus) = build_fleet(&toml);
    bus.fail_on(SerialNumber(2), Operation::SetEnableState, 0x5);
    fleet.init();
    bus.clear_calls(SerialNumber(1));
    bus.clear_calls(SerialNumber(2));

    fleet.read();
    fleet.write();

    assert_eq!(bus.calls(SerialNumber(1)).len(), 4);
    assert!(bus.calls(SerialNumber(2)).is_empty());
}

#[test]
fn diagnostics_cover_every_axis() {
    let (mut fleet, bus) = build_fleet(&three_axes());
    bus.set_missing(SerialNumber(3));
    fleet.init();

    let status = fleet.diagnostics();
    assert_eq!(status.len(), 3);
    assert_eq!(status[2].name, "lift");
    assert_eq!(status[2].serial, SerialNumber(3));
    assert_eq!(status[2].state, AxisState::Failed);
}

#[test]
fn shutdown_disables_and_closes_every_node() {
    let (mut fleet, bus) = build_fleet(&three_axes());
    fleet.init();
    fleet.shutdown().unwrap();

    for serial in 1..=3 {
        let snapshot = bus.node_snapshot(SerialNumber(serial)).unwrap();
        assert!(!snapshot.enabled);
        assert!(!snapshot.open);
    }
    assert!(fleet.axes().iter().all(|a| a.state() == AxisState::Disabled));

    fleet.shutdown().unwrap();
    drop(fleet);
    let closes = bus
        .operations(SerialNumber(1))
        .into_iter()
        .filter(|op| *op == Operation::CloseNode)
        .count();
    assert_eq!(closes, 1);
}

#[test]
fn dropping_fleet_releases_nodes() {
    let (mut fleet, bus) = build_fleet(&motor("wheel", "1", 3));
    fleet.init();
    drop(fleet);
    assert!(!bus.node_snapshot(SerialNumber(1)).unwrap().open);
}

#[test]
fn hal_core_runs_configured_cycles() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("fleet.toml");
    let toml = format!(
        "cycle_time_us = 100\n\n[driver_config.simulation]\nmissing = [\"2\"]\n{}",
        [motor("left", "1", 3), motor("right", "2", 3)].concat()
    );
    fs::write(&path, toml).unwrap();

    let config = HalCore::load_config(&path).unwrap();
    let mut core = HalCore::new(config).unwrap();
    let report = core
        .init(&DriverRegistry::with_builtin(), "simulation")
        .unwrap();
    assert_eq!(report.enabled, vec!["left".to_string()]);
    assert_eq!(
        report.failed[0].error,
        AxisError::DeviceNotFound {
            serial: SerialNumber(2)
        }
    );

    core.run(Some(3)).unwrap();
    assert_eq!(core.stats().cycle_count, 3);
    assert!(!core.running_flag().load(Ordering::SeqCst));

    core.shutdown().unwrap();
    let fleet = core.fleet().unwrap();
    assert_eq!(fleet.axis("left").unwrap().state(), AxisState::Disabled);
}

#[test]
fn call_log_stays_bounded_over_many_cycles() {
    let config = FleetConfig::from_toml(&motor("wheel", "1", 3)).unwrap();
    let mut library = SimulationLibrary::new();
    let bus = library.bus();
    library.init(&config).unwrap();
    let mut fleet = Fleet::from_config(&config, Box::new(library)).unwrap();
    fleet.init();
    fleet.set_setpoint("wheel", 10);

    for _ in 0..CALL_LOG_CAPACITY {
        fleet.read();
        fleet.write();
    }

    let calls = bus.calls(SerialNumber(1));
    assert_eq!(calls.len(), CALL_LOG_CAPACITY);
    assert_eq!(calls.last(), Some(&VendorCall::MoveWithVelocity(10)));
}

#[test]
fn hal_core_honors_stop_requested_before_run() {
    let config = FleetConfig::from_toml(&motor("wheel", "1", 3)).unwrap();
    let mut core = HalCore::new(config).unwrap();
    core.init(&DriverRegistry::with_builtin(), "simulation")
        .unwrap();

    core.running_flag().store(false, Ordering::SeqCst);
    core.run(Some(5)).unwrap();
    assert_eq!(core.stats().cycle_count, 0);
}

#[test]
fn hal_core_missing_config_file() {
    let tmp = TempDir::new().unwrap();
    let result = HalCore::load_config(&tmp.path().join("absent.toml"));
    assert!(matches!(
        result,
        Err(HalError::ConfigError(ConfigError::FileNotFound))
    ));
}
