//! Cycle benchmark: one `read()` + `write()` pass over N simulated axes.
//!
//! Measures the fleet fan-out and per-axis bookkeeping. Vendor calls go to
//! the in-process simulation backend, so real bus latency is excluded.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use epos_common::config::ConfigLoader;
use epos_common::hal::config::FleetConfig;
use epos_hal::Fleet;
use epos_hal::drivers::simulation::SimulationLibrary;

/// Fleet of `n` profile velocity axes on DC motors.
fn fleet_toml(n: usize) -> String {
    (0..n)
        .map(|i| {
            format!(
                r#"
[[motors]]
name = "axis_{i:02}"
serial_number = "{serial:X}"
operation_mode = 3
setpoint = 100

[motors.motor]
type = 1
dc_motor = {{ nominal_current = 1.0, max_output_current = 2.0, thermal_time_constant = 1.0 }}

[motors.sensor]
type = 1
incremental_encoder = {{ resolution = 500, inverted_polarity = false }}
"#,
                serial = 0x6000_0000u64 + i as u64
            )
        })
        .collect()
}

fn build_fleet(n: usize) -> Fleet {
    let config = FleetConfig::from_toml(&fleet_toml(n)).expect("config");
    let library = SimulationLibrary::new();
    let bus = library.bus();
    let mut fleet = Fleet::from_config(&config, Box::new(library)).expect("fleet");
    assert!(fleet.init().all_enabled());
    bus.set_recording(false);
    fleet
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("fleet_cycle");

    for n in [1usize, 8, 32, 64] {
        let mut fleet = build_fleet(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                fleet.read();
                fleet.write();
                black_box(fleet.axes().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cycle);
criterion_main!(benches);
