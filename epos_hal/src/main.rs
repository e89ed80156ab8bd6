//! # EPOS HAL Binary
//!
//! Loads a fleet configuration, initializes every axis through the selected
//! vendor library and runs the cyclic read/write loop until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Run with the library named in the config (default: simulation)
//! epos_hal --config /etc/epos/fleet.toml
//!
//! # Override the library
//! epos_hal --config fleet.toml --library simulation
//!
//! # Run 1000 cycles with verbose logging
//! epos_hal --config fleet.toml --cycles 1000 -v
//! ```

#![deny(warnings)]

use clap::Parser;
use epos_common::consts::DEFAULT_CONFIG_PATH;
use epos_hal::core::HalCore;
use epos_hal::driver_registry::DriverRegistry;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// EPOS HAL - fleet initialization and cyclic I/O for EPOS controllers
#[derive(Parser, Debug)]
#[command(name = "epos_hal")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fleet HAL for EPOS motor controllers")]
#[command(long_about = None)]
struct Args {
    /// Path to the fleet configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Vendor library backend (overrides `library` in the config)
    #[arg(short, long)]
    library: Option<String>,

    /// Stop after this many cycles
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("HAL startup failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = HalCore::load_config(&args.config);

    // The log level from the config applies unless -v is given.
    let directive = match &config {
        Ok(config) if !args.verbose => config.log_level.as_directive(),
        _ if args.verbose => "debug",
        _ => "info",
    };
    setup_tracing(directive, args.json);
    let config = config?;

    info!("EPOS HAL v{} starting...", env!("CARGO_PKG_VERSION"));

    let library = args.library.clone().unwrap_or_else(|| config.library.clone());
    let registry = DriverRegistry::with_builtin();
    let mut hal_core = HalCore::new(config)?;

    let running = hal_core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let report = hal_core.init(&registry, &library)?;
    for failure in &report.failed {
        match failure.serial {
            Some(serial) => warn!("Axis '{}' ({}) unavailable: {}", failure.name, serial, failure.error),
            None => warn!("Axis '{}' unavailable: {}", failure.name, failure.error),
        }
    }

    if let Err(e) = hal_core.run(args.cycles) {
        error!("Loop error: {}", e);
    }

    hal_core.shutdown()?;

    let stats = hal_core.stats();
    info!(
        "EPOS HAL shutdown complete ({} cycles, avg={}us, max={}us)",
        stats.cycle_count,
        stats.avg_cycle_time_us(),
        stats.max_cycle_time_us
    );
    Ok(())
}

/// Setup tracing subscriber.
fn setup_tracing(directive: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
